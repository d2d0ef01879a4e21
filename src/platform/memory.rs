//! In-memory DOM.
//!
//! A small element tree with attributes, form-control state, bubbling events
//! and a CSS selector subset. It runs the complete attachment protocol on any
//! target, which is what the test-suite drives.

mod selector;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};

use crate::dom::{Dom, DomError, Handler, NodeSet};
use crate::inline_delete::protocol::{DeleteRequest, DeleteTransport, TransportResponse};
use crate::notify::Notifier;

use self::selector::SelectorList;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: String,
    checked: bool,
    hidden: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            checked: false,
            hidden: false,
            parent: None,
            children: Vec::new(),
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match name {
            "value" => self.value = value.to_owned(),
            "checked" => self.checked = true,
            _ => {}
        }
        self.attributes.insert(name.to_owned(), value.to_owned());
    }
}

struct Listener {
    node: NodeId,
    event: String,
    handler: Rc<RefCell<Handler<NodeId>>>,
}

struct Tree {
    nodes: Vec<NodeData>,
    listeners: Vec<Listener>,
    dispatched: Vec<(NodeId, String)>,
    path: String,
    cookies: String,
}

impl Tree {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, |&current| self.node(current).parent)
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        found
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&child| child != id);
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|current| current == ancestor)
    }
}

fn parse_selector(selector: &str) -> Option<SelectorList> {
    match SelectorList::parse(selector) {
        Ok(list) => Some(list),
        Err(error) => {
            log::warn!("[MemoryDom] {error}");
            None
        }
    }
}

#[derive(Clone)]
pub struct MemoryDom {
    tree: Rc<RefCell<Tree>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Empty document whose root element is `<html>`.
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree {
                nodes: vec![NodeData::new("html")],
                listeners: Vec::new(),
                dispatched: Vec::new(),
                path: "/".to_owned(),
                cookies: String::new(),
            })),
        }
    }

    pub fn set_page_path(&self, path: &str) {
        self.tree.borrow_mut().path = path.to_owned();
    }

    pub fn set_cookies(&self, cookies: &str) {
        self.tree.borrow_mut().cookies = cookies.to_owned();
    }

    /// Creates an element that is not yet part of the document.
    pub fn detached(&self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let mut data = NodeData::new(tag);
        for (name, value) in attributes {
            data.set_attribute(name, value);
        }
        tree.nodes.push(data);
        NodeId(tree.nodes.len() - 1)
    }

    /// Creates an element and appends it to `parent`.
    pub fn element(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = self.detached(tag, attributes);
        self.attach(parent, id);
        id
    }

    fn attach(&self, parent: NodeId, child: NodeId) {
        let mut tree = self.tree.borrow_mut();
        tree.detach(child);
        tree.node_mut(child).parent = Some(parent);
        tree.node_mut(parent).children.push(child);
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.tree.borrow().node(node).tag.clone()
    }

    pub fn text(&self, node: NodeId) -> String {
        self.tree.borrow().node(node).text.clone()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.borrow().node(node).children.clone()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.tree.borrow().node(node).has_class(class)
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.tree.borrow().node(node).hidden
    }

    /// Number of elements under `root` (inclusive) matching `selector`.
    pub fn count(&self, root: NodeId, selector: &str) -> usize {
        usize::from(self.matches(&root, selector)) + self.find_all(&root, selector).len()
    }

    /// How many `event`s were dispatched with `node` as target.
    pub fn dispatched(&self, node: NodeId, event: &str) -> usize {
        self.tree
            .borrow()
            .dispatched
            .iter()
            .filter(|(target, name)| *target == node && name == event)
            .count()
    }

    /// Sets a field's value the way typing does and fires `input`.
    pub fn input(&self, node: NodeId, value: &str) {
        self.tree.borrow_mut().node_mut(node).value = value.to_owned();
        self.fire(node, "input");
    }

    pub fn click(&self, node: NodeId) {
        self.fire(node, "click");
    }

    fn fire(&self, node: NodeId, event: &str) {
        if let Err(error) = self.dispatch(&node, event) {
            log::warn!("[MemoryDom] {error}");
        }
    }
}

#[derive(Default)]
pub struct MemoryNodeSet(HashSet<NodeId>);

impl NodeSet<NodeId> for MemoryNodeSet {
    fn insert(&mut self, node: &NodeId) -> bool {
        self.0.insert(*node)
    }

    fn contains(&self, node: &NodeId) -> bool {
        self.0.contains(node)
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;
    type NodeSet = MemoryNodeSet;

    fn find_all(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        let Some(list) = parse_selector(selector) else {
            return Vec::new();
        };
        let tree = self.tree.borrow();
        tree.descendants(*root)
            .into_iter()
            .filter(|&node| list.matches(&tree, node))
            .collect()
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        parse_selector(selector).is_some_and(|list| list.matches(&self.tree.borrow(), *node))
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let list = parse_selector(selector)?;
        let tree = self.tree.borrow();
        std::iter::once(*node)
            .chain(tree.ancestors(*node))
            .find(|&current| list.matches(&tree, current))
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.tree.borrow().node(*node).parent
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree.borrow().node(*node).attributes.get(name).cloned()
    }

    fn value(&self, node: &NodeId) -> String {
        self.tree.borrow().node(*node).value.clone()
    }

    fn is_checked(&self, node: &NodeId) -> bool {
        self.tree.borrow().node(*node).checked
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomError::new("create_element", format!("invalid tag name `{tag}`")));
        }
        Ok(self.detached(tag, &[]))
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.tree.borrow_mut().node_mut(*node).set_attribute(name, value);
        Ok(())
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        self.tree.borrow_mut().node_mut(*node).text = text.to_owned();
    }

    fn toggle_class(&self, node: &NodeId, class: &str, on: bool) -> Result<(), DomError> {
        if class.is_empty() || class.contains(char::is_whitespace) {
            return Err(DomError::new("toggle_class", format!("invalid class `{class}`")));
        }
        let mut tree = self.tree.borrow_mut();
        let data = tree.node_mut(*node);
        let mut classes: Vec<String> = data
            .attributes
            .get("class")
            .map(|classes| classes.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_owned());
        } else if !on && present {
            classes.retain(|c| c != class);
        }
        data.attributes.insert("class".to_owned(), classes.join(" "));
        Ok(())
    }

    fn set_checked(&self, node: &NodeId, checked: bool) {
        self.tree.borrow_mut().node_mut(*node).checked = checked;
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        if self.tree.borrow().is_inclusive_ancestor(*child, *parent) {
            return Err(DomError::new("append_child", "the new child is an ancestor of the parent"));
        }
        self.attach(*parent, *child);
        Ok(())
    }

    fn insert_after(&self, reference: &NodeId, node: &NodeId) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let Some(parent) = tree.node(*reference).parent else {
            return Err(DomError::new("insert_after", "reference node has no parent"));
        };
        if tree.is_inclusive_ancestor(*node, parent) {
            return Err(DomError::new("insert_after", "the node is an ancestor of the reference"));
        }
        tree.detach(*node);
        let siblings = &mut tree.node_mut(parent).children;
        let position = siblings
            .iter()
            .position(|sibling| sibling == reference)
            .map_or(siblings.len(), |index| index + 1);
        siblings.insert(position, *node);
        tree.node_mut(*node).parent = Some(parent);
        Ok(())
    }

    fn hide(&self, node: &NodeId) -> Result<(), DomError> {
        self.tree.borrow_mut().node_mut(*node).hidden = true;
        Ok(())
    }

    fn dispatch(&self, node: &NodeId, event: &str) -> Result<(), DomError> {
        let handlers: Vec<_> = {
            let mut tree = self.tree.borrow_mut();
            tree.dispatched.push((*node, event.to_owned()));
            let path: Vec<NodeId> = std::iter::once(*node).chain(tree.ancestors(*node)).collect();
            path.iter()
                .flat_map(|current| {
                    tree.listeners
                        .iter()
                        .filter(move |listener| listener.node == *current && listener.event == event)
                })
                .map(|listener| Rc::clone(&listener.handler))
                .collect()
        };
        for handler in handlers {
            match handler.try_borrow_mut() {
                Ok(mut handler) => (*handler)(*node),
                Err(_) => log::warn!("[MemoryDom] Skipped re-entrant `{event}` handler"),
            }
        }
        Ok(())
    }

    fn listen(&self, node: &NodeId, event: &str, handler: Handler<NodeId>) -> Result<(), DomError> {
        self.tree.borrow_mut().listeners.push(Listener {
            node: *node,
            event: event.to_owned(),
            handler: Rc::new(RefCell::new(handler)),
        });
        Ok(())
    }

    fn document_root(&self) -> NodeId {
        NodeId(0)
    }

    fn page_path(&self) -> String {
        self.tree.borrow().path.clone()
    }

    fn cookies(&self) -> String {
        self.tree.borrow().cookies.clone()
    }
}

/// Delete transport answering from a queue of scripted responses.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<TransportResponse, String>>>,
    requests: RefCell<Vec<DeleteRequest>>,
}

impl ScriptedTransport {
    pub fn respond(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(TransportResponse {
            status,
            body: body.to_owned(),
        }));
    }

    pub fn fail(&self, message: &str) {
        self.responses.borrow_mut().push_back(Err(message.to_owned()));
    }

    pub fn requests(&self) -> Vec<DeleteRequest> {
        self.requests.borrow().clone()
    }
}

impl DeleteTransport for ScriptedTransport {
    fn send(&self, request: &DeleteRequest) -> LocalBoxFuture<'static, Result<TransportResponse, String>> {
        self.requests.borrow_mut().push(request.clone());
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response".to_owned()));
        futures_util::future::ready(response).boxed_local()
    }
}

#[derive(Default)]
pub struct CollectingNotifier {
    messages: RefCell<Vec<String>>,
}

impl CollectingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for CollectingNotifier {
    fn report_error(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_in_document_order() {
        let dom = MemoryDom::new();
        let root = dom.document_root();
        let table = dom.element(root, "table", &[]);
        let first = dom.element(table, "tr", &[("class", "form-row")]);
        let cell = dom.element(first, "td", &[]);
        let nested = dom.element(cell, "span", &[("class", "form-row")]);
        let second = dom.element(table, "tr", &[("class", "form-row has_original")]);

        assert_eq!(dom.find_all(&root, ".form-row"), vec![first, nested, second]);
        assert_eq!(dom.find_all(&first, ".form-row"), vec![nested]);
        assert_eq!(dom.find_all(&root, "tr.form-row"), vec![first, second]);
    }

    #[test]
    fn test_descendant_selector_and_closest() {
        let dom = MemoryDom::new();
        let root = dom.document_root();
        let row = dom.element(root, "div", &[("class", "form-row")]);
        let box_ = dom.element(row, "div", &[("class", "fieldBox")]);
        let input = dom.element(box_, "input", &[("name", "title")]);

        assert!(dom.matches(&box_, ".form-row .fieldBox"));
        assert!(!dom.matches(&row, ".form-row .fieldBox"));
        assert_eq!(dom.closest(&input, ".fieldBox, .form-row"), Some(box_));
        assert_eq!(dom.closest(&input, "input"), Some(input));
        assert_eq!(dom.closest(&input, "table"), None);
    }

    #[test]
    fn test_insert_after_keeps_sibling_order() {
        let dom = MemoryDom::new();
        let root = dom.document_root();
        let a = dom.element(root, "input", &[]);
        let c = dom.element(root, "p", &[]);
        let b = dom.detached("div", &[]);
        dom.insert_after(&a, &b).unwrap();
        assert_eq!(dom.children(root), vec![a, b, c]);
        assert_eq!(dom.parent(&b), Some(root));
    }

    #[test]
    fn test_append_child_rejects_cycles() {
        let dom = MemoryDom::new();
        let root = dom.document_root();
        let outer = dom.element(root, "div", &[]);
        let inner = dom.element(outer, "div", &[]);
        assert!(dom.append_child(&inner, &outer).is_err());
        assert!(dom.append_child(&outer, &outer).is_err());
    }

    #[test]
    fn test_events_bubble_to_ancestors() {
        let dom = MemoryDom::new();
        let root = dom.document_root();
        let row = dom.element(root, "tr", &[]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        dom.listen(&root, "formset:added", Box::new(move |target: NodeId| sink.borrow_mut().push(target)))
            .unwrap();

        dom.dispatch(&row, "formset:added").unwrap();
        dom.dispatch(&row, "change").unwrap();
        assert_eq!(*seen.borrow(), vec![row]);
        assert_eq!(dom.dispatched(row, "formset:added"), 1);
    }

    #[test]
    fn test_toggle_class() {
        let dom = MemoryDom::new();
        let node = dom.element(dom.document_root(), "div", &[("class", "a")]);
        dom.toggle_class(&node, "b", true).unwrap();
        dom.toggle_class(&node, "b", true).unwrap();
        assert_eq!(dom.attribute(&node, "class").as_deref(), Some("a b"));
        dom.toggle_class(&node, "a", false).unwrap();
        assert_eq!(dom.attribute(&node, "class").as_deref(), Some("b"));
        assert!(dom.toggle_class(&node, "two words", true).is_err());
    }

    #[test]
    fn test_value_attribute_initialises_value() {
        let dom = MemoryDom::new();
        let input = dom.element(dom.document_root(), "input", &[("value", "42"), ("checked", "")]);
        assert_eq!(dom.value(&input), "42");
        assert!(dom.is_checked(&input));
        dom.input(input, "43");
        assert_eq!(dom.value(&input), "43");
        assert_eq!(dom.attribute(&input, "value").as_deref(), Some("42"));
    }
}
