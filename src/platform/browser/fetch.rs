//! `fetch` transport, `alert` notifier and task spawning for the browser.

use futures_util::future::{FutureExt, LocalBoxFuture, LocalFutureObj};
use futures_util::task::{LocalSpawn, SpawnError};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, Response, UrlSearchParams};

use super::dom::js_message;
use crate::inline_delete::protocol::{DeleteRequest, DeleteTransport, TransportResponse};
use crate::notify::Notifier;

pub struct FetchTransport;

impl DeleteTransport for FetchTransport {
    fn send(&self, request: &DeleteRequest) -> LocalBoxFuture<'static, Result<TransportResponse, String>> {
        let request = request.clone();
        async move { post(&request).await.map_err(|error| js_message(&error)) }.boxed_local()
    }
}

async fn post(request: &DeleteRequest) -> Result<TransportResponse, JsValue> {
    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_credentials(RequestCredentials::SameOrigin);

    let headers = Headers::new()?;
    if !request.token.is_empty() {
        headers.set(&request.token_header, &request.token)?;
    }
    opts.set_headers(&headers);

    // `URLSearchParams` makes the body `application/x-www-form-urlencoded`.
    if !request.form.is_empty() {
        let form = UrlSearchParams::new()?;
        for (name, value) in &request.form {
            form.append(name, value);
        }
        opts.set_body(&form);
    }

    let web_request = Request::new_with_str_and_init(&request.url, &opts)?;
    let response: Response = JsFuture::from(zoon::window().fetch_with_request(&web_request))
        .await?
        .dyn_into()?;
    let body = JsFuture::from(response.text()?)
        .await?
        .as_string()
        .unwrap_or_default();

    Ok(TransportResponse {
        status: response.status(),
        body,
    })
}

/// Shows errors with the blocking `window.alert`.
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn report_error(&self, message: &str) {
        if let Err(error) = zoon::window().alert_with_message(message) {
            log::error!("[Alert] {message} ({})", js_message(&error));
        }
    }
}

/// Runs futures on the browser event loop through `zoon::Task`.
pub struct TaskSpawner;

impl LocalSpawn for TaskSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        zoon::Task::start(future);
        Ok(())
    }
}
