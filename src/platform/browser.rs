//! Browser entry point.
//!
//! Nothing happens before the document is parsed. Then the widgets config is
//! read from the page and both widgets are attached to the whole document.
//! From there on every row announced by the formset's insertion event is
//! scanned on its own.

mod dom;
mod fetch;
mod logger;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::{Document, Element};

pub use dom::{WeakNodeSet, WebDom};
pub use fetch::{AlertNotifier, FetchTransport, TaskSpawner};

use crate::config::{CONFIG_ELEMENT_ID, WidgetsConfig};
use crate::dom::{Dom, DomError};
use crate::scanner::Scanner;

thread_local! {
    static SCANNER: RefCell<Option<Rc<Scanner<WebDom>>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    logger::init(log::LevelFilter::Info);
    let document = zoon::document();

    // The config element may come after this bundle's script tag.
    if document.ready_state() != "loading" {
        install_once(&document);
        return;
    }
    let on_ready = document.clone();
    let closure = Closure::wrap(Box::new(move |_: web_sys::Event| {
        install_once(&on_ready);
    }) as Box<dyn FnMut(_)>);
    if let Err(error) =
        document.add_event_listener_with_callback("DOMContentLoaded", closure.as_ref().unchecked_ref())
    {
        log::error!("[FormsetWidgets] Not installed: {}", dom::js_message(&error));
        return;
    }
    closure.forget();
}

/// Attaches the widgets inside `root`. For pages whose row-adding code does
/// not dispatch the insertion event as a DOM event.
#[wasm_bindgen(js_name = scanFormsetRow)]
pub fn scan_formset_row(root: Element) {
    SCANNER.with(|cell| match cell.borrow().as_ref() {
        Some(scanner) => {
            scanner.scan(&root);
        }
        None => log::warn!("[FormsetWidgets] scanFormsetRow called before start"),
    });
}

/// Config from the page's JSON script element; defaults when it is missing
/// or malformed.
pub fn page_config(document: &Document) -> WidgetsConfig {
    let Some(element) = document.get_element_by_id(CONFIG_ELEMENT_ID) else {
        return WidgetsConfig::default();
    };
    let json = element.text_content().unwrap_or_default();
    WidgetsConfig::from_json(&json).unwrap_or_else(|error| {
        log::error!("[FormsetWidgets] {error}; using defaults");
        WidgetsConfig::default()
    })
}

/// Reads the config, builds the scanner and scans the whole document.
/// Later calls are no-ops.
fn install_once(document: &Document) {
    if SCANNER.with(|cell| cell.borrow().is_some()) {
        return;
    }
    let config = page_config(document);
    log::set_max_level(config.log_level());

    match install(document, &config) {
        Ok(scanner) => {
            let root = scanner.dom().document_root();
            SCANNER.with(|cell| *cell.borrow_mut() = Some(Rc::clone(&scanner)));
            scanner.scan(&root);
        }
        Err(error) => log::error!("[FormsetWidgets] Not installed: {error}"),
    }
}

fn install(document: &Document, config: &WidgetsConfig) -> Result<Rc<Scanner<WebDom>>, DomError> {
    let dom = WebDom::new(document.clone())
        .ok_or_else(|| DomError::new("install", "document has no root element"))?;
    let scanner = Rc::new(config.scanner(
        dom,
        Rc::new(FetchTransport),
        Rc::new(AlertNotifier),
        Rc::new(TaskSpawner),
    ));
    scanner.observe_insertions()?;
    Ok(scanner)
}
