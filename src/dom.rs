//! Abstract DOM capability used by the scanner and the widgets.
//!
//! Implemented by the real browser document (`platform::browser`) and by the
//! in-memory tree in `platform::memory`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("DOM operation `{operation}` failed: {message}")]
pub struct DomError {
    pub operation: &'static str,
    pub message: String,
}

impl DomError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Identity-keyed set of nodes.
///
/// Membership is by node identity, never by attributes stored on the node.
pub trait NodeSet<N>: Default {
    /// Returns `false` when the node was already present.
    fn insert(&mut self, node: &N) -> bool;
    fn contains(&self, node: &N) -> bool;
}

pub type Handler<N> = Box<dyn FnMut(N)>;

pub trait Dom: Clone + 'static {
    type Node: Clone + 'static;
    type NodeSet: NodeSet<Self::Node>;

    // --- queries ---

    /// All descendants of `root` matching `selector`, in document order.
    /// `root` itself is never included.
    fn find_all(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    fn find_first(&self, root: &Self::Node, selector: &str) -> Option<Self::Node> {
        self.find_all(root, selector).into_iter().next()
    }

    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Current value of a form control; empty for other elements.
    fn value(&self, node: &Self::Node) -> String;

    fn is_checked(&self, node: &Self::Node) -> bool;

    // --- mutation ---

    fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    fn set_text(&self, node: &Self::Node, text: &str);

    /// Adds `class` when `on`, removes it otherwise.
    fn toggle_class(&self, node: &Self::Node, class: &str, on: bool) -> Result<(), DomError>;

    fn set_checked(&self, node: &Self::Node, checked: bool);

    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    fn insert_after(&self, reference: &Self::Node, node: &Self::Node) -> Result<(), DomError>;

    /// Hides the element without removing it from the document.
    fn hide(&self, node: &Self::Node) -> Result<(), DomError>;

    // --- events ---

    /// Dispatches a bubbling event of type `event` at `node`.
    fn dispatch(&self, node: &Self::Node, event: &str) -> Result<(), DomError>;

    /// Subscribes `handler` to `event` on `node`, including events bubbling up
    /// from descendants. The handler receives the event target.
    fn listen(&self, node: &Self::Node, event: &str, handler: Handler<Self::Node>) -> Result<(), DomError>;

    // --- document ---

    fn document_root(&self) -> Self::Node;

    /// Path component of the current page location.
    fn page_path(&self) -> String;

    /// Raw `name=value; ...` cookie string of the document.
    fn cookies(&self) -> String;
}
