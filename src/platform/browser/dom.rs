use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Document, Element, Event, EventInit, HtmlDocument, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
};

use crate::dom::{Dom, DomError, Handler, NodeSet};

pub(super) fn js_message(error: &JsValue) -> String {
    error
        .as_string()
        .or_else(|| {
            error
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{error:?}"))
}

fn js_error(operation: &'static str) -> impl Fn(JsValue) -> DomError {
    move |error| DomError::new(operation, js_message(&error))
}

fn warn_invalid_selector(selector: &str, error: &JsValue) {
    log::warn!("[WebDom] Invalid selector `{selector}`: {}", js_message(error));
}

/// The live page document.
#[derive(Clone)]
pub struct WebDom {
    document: Document,
    root: Element,
}

impl WebDom {
    pub fn new(document: Document) -> Option<Self> {
        let root = document.document_element()?;
        Some(Self { document, root })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Backed by a JS `WeakSet`, so claimed elements can still be collected.
pub struct WeakNodeSet(js_sys::WeakSet);

impl Default for WeakNodeSet {
    fn default() -> Self {
        Self(js_sys::WeakSet::new())
    }
}

impl NodeSet<Element> for WeakNodeSet {
    fn insert(&mut self, node: &Element) -> bool {
        let object = node.unchecked_ref::<js_sys::Object>();
        if self.0.has(object) {
            return false;
        }
        self.0.add(object);
        true
    }

    fn contains(&self, node: &Element) -> bool {
        self.0.has(node.unchecked_ref::<js_sys::Object>())
    }
}

impl Dom for WebDom {
    type Node = Element;
    type NodeSet = WeakNodeSet;

    fn find_all(&self, root: &Element, selector: &str) -> Vec<Element> {
        let list = match root.query_selector_all(selector) {
            Ok(list) => list,
            Err(error) => {
                warn_invalid_selector(selector, &error);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn find_first(&self, root: &Element, selector: &str) -> Option<Element> {
        root.query_selector(selector).unwrap_or_else(|error| {
            warn_invalid_selector(selector, &error);
            None
        })
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            textarea.value()
        } else {
            String::new()
        }
    }

    fn is_checked(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>()
            .is_some_and(HtmlInputElement::checked)
    }

    fn create_element(&self, tag: &str) -> Result<Element, DomError> {
        self.document
            .create_element(tag)
            .map_err(js_error("create_element"))
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) -> Result<(), DomError> {
        node.set_attribute(name, value).map_err(js_error("set_attribute"))
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn toggle_class(&self, node: &Element, class: &str, on: bool) -> Result<(), DomError> {
        node.class_list()
            .toggle_with_force(class, on)
            .map(|_| ())
            .map_err(js_error("toggle_class"))
    }

    fn set_checked(&self, node: &Element, checked: bool) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_checked(checked);
        }
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(js_error("append_child"))
    }

    fn insert_after(&self, reference: &Element, node: &Element) -> Result<(), DomError> {
        reference
            .insert_adjacent_element("afterend", node)
            .map(|_| ())
            .map_err(js_error("insert_after"))
    }

    fn hide(&self, node: &Element) -> Result<(), DomError> {
        match node.dyn_ref::<HtmlElement>() {
            Some(element) => element
                .style()
                .set_property("display", "none")
                .map_err(js_error("hide")),
            None => node.set_attribute("hidden", "").map_err(js_error("hide")),
        }
    }

    fn dispatch(&self, node: &Element, event: &str) -> Result<(), DomError> {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = Event::new_with_event_init_dict(event, &init).map_err(js_error("dispatch"))?;
        node.dispatch_event(&event)
            .map(|_| ())
            .map_err(js_error("dispatch"))
    }

    fn listen(&self, node: &Element, event: &str, handler: Handler<Element>) -> Result<(), DomError> {
        let mut handler = handler;
        let closure = Closure::wrap(Box::new(move |dom_event: Event| {
            let target = dom_event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok());
            if let Some(target) = target {
                handler(target);
            }
        }) as Box<dyn FnMut(_)>);
        node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(js_error("listen"))?;
        // Listeners live as long as the page.
        closure.forget();
        Ok(())
    }

    fn document_root(&self) -> Element {
        self.root.clone()
    }

    fn page_path(&self) -> String {
        self.document
            .location()
            .and_then(|location| location.pathname().ok())
            .unwrap_or_default()
    }

    fn cookies(&self) -> String {
        self.document
            .dyn_ref::<HtmlDocument>()
            .and_then(|document| document.cookie().ok())
            .unwrap_or_default()
    }
}
