//! Attachment scanner.
//!
//! Finds unclaimed candidates for every registered widget inside a subtree
//! and binds each of them exactly once. Bookkeeping lives in an identity-keyed
//! registry owned by the scanner, not on the nodes themselves.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::dom::{Dom, DomError, NodeSet};

pub const DEFAULT_TEMPLATE_SELECTOR: &str = ".empty-form";
pub const DEFAULT_INSERTION_EVENT: &str = "formset:added";

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("required element `{0}` not found")]
    MissingElement(String),
}

/// A widget type the scanner can bind to matching elements.
pub trait Attachable<D: Dom> {
    /// Registry key; two widgets with the same kind share their claims.
    fn kind(&self) -> &'static str;

    fn selector(&self) -> &str;

    /// Structural precondition checked before the element is claimed.
    /// Rejected elements are skipped silently and may be retried by a later scan.
    fn accepts(&self, _dom: &D, _node: &D::Node) -> bool {
        true
    }

    fn bind(&self, dom: &D, node: &D::Node) -> Result<(), WidgetError>;
}

pub struct AttachRegistry<D: Dom> {
    claimed: BTreeMap<&'static str, D::NodeSet>,
}

impl<D: Dom> Default for AttachRegistry<D> {
    fn default() -> Self {
        Self {
            claimed: BTreeMap::new(),
        }
    }
}

impl<D: Dom> AttachRegistry<D> {
    /// Marks `node` as attached for `kind`. Returns `false` if it already was.
    pub fn claim(&mut self, kind: &'static str, node: &D::Node) -> bool {
        self.claimed.entry(kind).or_default().insert(node)
    }

    pub fn is_attached(&self, kind: &'static str, node: &D::Node) -> bool {
        self.claimed
            .get(kind)
            .is_some_and(|set| set.contains(node))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Elements bound during this scan.
    pub bound: usize,
    /// Elements claimed whose `bind` returned an error.
    pub failed: usize,
}

impl std::ops::AddAssign for ScanReport {
    fn add_assign(&mut self, other: Self) {
        self.bound += other.bound;
        self.failed += other.failed;
    }
}

pub struct Scanner<D: Dom> {
    dom: D,
    template_selector: String,
    insertion_event: String,
    widgets: Vec<Box<dyn Attachable<D>>>,
    registry: RefCell<AttachRegistry<D>>,
}

impl<D: Dom> Scanner<D> {
    pub fn new(dom: D) -> Self {
        Self {
            dom,
            template_selector: DEFAULT_TEMPLATE_SELECTOR.to_owned(),
            insertion_event: DEFAULT_INSERTION_EVENT.to_owned(),
            widgets: Vec::new(),
            registry: RefCell::new(AttachRegistry::default()),
        }
    }

    pub fn template_selector(mut self, selector: impl Into<String>) -> Self {
        self.template_selector = selector.into();
        self
    }

    pub fn insertion_event(mut self, event: impl Into<String>) -> Self {
        self.insertion_event = event.into();
        self
    }

    pub fn widget(mut self, widget: impl Attachable<D> + 'static) -> Self {
        self.widgets.push(Box::new(widget));
        self
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn is_attached(&self, kind: &'static str, node: &D::Node) -> bool {
        self.registry.borrow().is_attached(kind, node)
    }

    /// Binds every registered widget to its unclaimed candidates in `root`,
    /// `root` included.
    pub fn scan(&self, root: &D::Node) -> ScanReport {
        let mut report = ScanReport::default();
        for widget in &self.widgets {
            report += self.scan_widget(widget.as_ref(), root);
        }
        if report.bound > 0 || report.failed > 0 {
            log::debug!(
                "[Scanner] Bound {} element(s), {} failed",
                report.bound,
                report.failed
            );
        }
        report
    }

    fn scan_widget(&self, widget: &dyn Attachable<D>, root: &D::Node) -> ScanReport {
        let selector = widget.selector();
        let mut candidates = Vec::new();
        if self.dom.matches(root, selector) {
            candidates.push(root.clone());
        }
        candidates.extend(self.dom.find_all(root, selector));

        let mut report = ScanReport::default();
        for node in candidates {
            if self.is_template(&node) {
                continue;
            }
            if self.is_attached(widget.kind(), &node) {
                continue;
            }
            if !widget.accepts(&self.dom, &node) {
                continue;
            }
            // Claim before binding: a nested scan triggered while binding sees
            // the element as attached.
            if !self.registry.borrow_mut().claim(widget.kind(), &node) {
                continue;
            }
            match widget.bind(&self.dom, &node) {
                Ok(()) => report.bound += 1,
                Err(error) => {
                    log::warn!("[Scanner] Failed to bind {}: {error}", widget.kind());
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn is_template(&self, node: &D::Node) -> bool {
        self.dom.closest(node, &self.template_selector).is_some()
    }

    /// Scans every row announced by the insertion event for the rest of the
    /// page's life.
    pub fn observe_insertions(self: &Rc<Self>) -> Result<(), DomError> {
        let scanner = Rc::clone(self);
        let root = self.dom.document_root();
        self.dom.listen(
            &root,
            &self.insertion_event,
            Box::new(move |row: D::Node| {
                scanner.scan(&row);
            }),
        )
    }
}
