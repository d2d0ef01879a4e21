#![cfg(target_arch = "wasm32")]

use std::rc::Rc;

use formset_widgets::inline_delete::protocol::{DeleteRequest, DeleteTransport};
use formset_widgets::platform::browser::{
    AlertNotifier, FetchTransport, TaskSpawner, WebDom, page_config,
};
use formset_widgets::{Dom, InlineDeletePreset, ScanReport, Scanner, WidgetsConfig};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Element, HtmlInputElement, Request};

wasm_bindgen_test_configure!(run_in_browser);

fn scanner() -> Scanner<WebDom> {
    let dom = WebDom::new(zoon::document()).expect("document element");
    WidgetsConfig::default().scanner(dom, Rc::new(FetchTransport), Rc::new(AlertNotifier), Rc::new(TaskSpawner))
}

fn fixture(html: &str) -> Element {
    let document = zoon::document();
    let container = document.create_element("div").expect("div created");
    container.set_inner_html(html);
    document
        .body()
        .expect("body")
        .append_child(&container)
        .expect("container appended");
    container
}

#[wasm_bindgen_test]
fn hint_tracks_typing() {
    let container = fixture(
        r#"<div class="form-row"><input name="title" data-charcount data-min="2" data-max="4" value="a"><div class="help"></div></div>"#,
    );
    let scanner = scanner();
    assert_eq!(scanner.scan(&container), ScanReport { bound: 1, failed: 0 });
    assert_eq!(scanner.scan(&container), ScanReport::default());

    let hint = container
        .query_selector(".help .char-count-hint")
        .unwrap()
        .expect("hint placed in help");
    assert_eq!(
        hint.text_content().unwrap_or_default(),
        "entered characters: 1 (recommendation: minimum 2, maximum 4)"
    );
    assert!(hint.class_list().contains("is-invalid"));

    let input: HtmlInputElement = container.query_selector("input").unwrap().unwrap().unchecked_into();
    input.set_value("abc");
    scanner.dom().dispatch(&input.clone().into(), "input").unwrap();
    assert!(hint.text_content().unwrap_or_default().starts_with("entered characters: 3 "));
    assert!(!hint.class_list().contains("is-invalid"));
}

#[wasm_bindgen_test]
fn persisted_row_gets_one_button() {
    let container = fixture(concat!(
        r#"<table><tbody>"#,
        r#"<tr class="form-row has_original"><td class="original"><input type="hidden" name="lines-0-id" value="5"></td>"#,
        r#"<td class="delete"><input type="checkbox" name="lines-0-DELETE"></td></tr>"#,
        r#"<tr class="form-row"><td class="original"><input type="hidden" name="lines-1-id" value=""></td><td class="delete"></td></tr>"#,
        r#"<tr class="form-row empty-form"><td class="original"><input type="hidden" name="lines-__prefix__-id" value="9"></td><td class="delete"></td></tr>"#,
        r#"</tbody></table>"#,
    ));
    let scanner = scanner();
    scanner.scan(&container);
    scanner.scan(&container);

    let buttons = container.query_selector_all("button.js-inline-delete-now").unwrap();
    assert_eq!(buttons.length(), 1);
    let checkbox: HtmlInputElement = container
        .query_selector("input[type=checkbox]")
        .unwrap()
        .unwrap()
        .unchecked_into();
    assert_eq!(checkbox.style().get_property_value("display").unwrap(), "none");
}

#[wasm_bindgen_test]
fn invalid_selector_finds_nothing() {
    let container = fixture(r#"<input name="title">"#);
    let dom = WebDom::new(zoon::document()).expect("document element");
    assert!(dom.find_first(&container, "input[").is_none());
    assert!(dom.find_all(&container, "input[").is_empty());
    assert!(dom.find_first(&container, "input").is_some());
}

#[wasm_bindgen_test]
fn config_is_read_from_script_element() {
    let document = zoon::document();
    let script = document.create_element("script").expect("script created");
    script.set_attribute("type", "application/json").unwrap();
    script.set_id("formset-widgets-config");
    script.set_text_content(Some(r#"{"locale": "ru", "inline_delete_preset": "employee-scoped"}"#));
    document.body().expect("body").append_child(&script).unwrap();

    let config = page_config(&document);
    script.remove();
    assert_eq!(config.inline_delete_preset, InlineDeletePreset::EmployeeScoped);
    assert_eq!(page_config(&document), WidgetsConfig::default());
}

/// Replaces `window.fetch` with a stub that records the request and answers
/// `200 {}`. Returns the original so it can be put back.
fn stub_fetch() -> JsValue {
    let window = zoon::window();
    let original = js_sys::Reflect::get(&window, &"fetch".into()).unwrap();
    let stub = js_sys::Function::new_with_args(
        "request",
        "window.__lastDeleteRequest = request; \
         return Promise.resolve(new Response('{}', { status: 200 }));",
    );
    js_sys::Reflect::set(&window, &"fetch".into(), &stub).unwrap();
    original
}

#[wasm_bindgen_test]
async fn fetch_transport_posts_token_and_form() {
    let original = stub_fetch();
    let request = DeleteRequest {
        url: "/admin/content/employee/inline-delete/7/".to_owned(),
        row_id: "7".to_owned(),
        token_header: "X-CSRFToken".to_owned(),
        token: "t0ken".to_owned(),
        form: vec![("employee_id".to_owned(), "3".to_owned())],
    };

    let response = FetchTransport.send(&request).await;
    let window = zoon::window();
    let sent: Request = js_sys::Reflect::get(&window, &"__lastDeleteRequest".into())
        .unwrap()
        .unchecked_into();
    js_sys::Reflect::set(&window, &"fetch".into(), &original).unwrap();

    let response = response.expect("stub answered");
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "{}");

    assert_eq!(sent.method(), "POST");
    assert!(sent.url().ends_with("/admin/content/employee/inline-delete/7/"));
    assert_eq!(sent.headers().get("X-CSRFToken").unwrap().as_deref(), Some("t0ken"));
    let content_type = sent.headers().get("Content-Type").unwrap().unwrap_or_default();
    assert!(content_type.starts_with("application/x-www-form-urlencoded"));
    let body = JsFuture::from(sent.text().unwrap()).await.unwrap();
    assert_eq!(body.as_string().as_deref(), Some("employee_id=3"));
}

#[wasm_bindgen_test]
async fn fetch_transport_without_form_sends_no_body() {
    let original = stub_fetch();
    let request = DeleteRequest {
        url: "/admin/content/employee/inline-delete/8/".to_owned(),
        row_id: "8".to_owned(),
        token_header: "X-CSRFToken".to_owned(),
        token: String::new(),
        form: Vec::new(),
    };

    let response = FetchTransport.send(&request).await;
    let window = zoon::window();
    let sent: Request = js_sys::Reflect::get(&window, &"__lastDeleteRequest".into())
        .unwrap()
        .unchecked_into();
    js_sys::Reflect::set(&window, &"fetch".into(), &original).unwrap();

    assert!(response.is_ok());
    assert_eq!(sent.headers().get("X-CSRFToken").unwrap(), None);
    let body = JsFuture::from(sent.text().unwrap()).await.unwrap();
    assert_eq!(body.as_string().as_deref(), Some(""));
}
