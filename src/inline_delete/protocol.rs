//! Network side of an instant delete.

use futures_util::future::LocalBoxFuture;
use thiserror::Error;

/// One delete round trip. Built on click, dropped once it settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub url: String,
    pub row_id: String,
    pub token_header: String,
    /// Empty when the page carries no anti-forgery cookie.
    pub token: String,
    /// Form fields sent as the request body; no body when empty.
    pub form: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends `POST` requests to the delete endpoint.
pub trait DeleteTransport {
    /// Resolves with whatever the server answered; `Err` only for failures
    /// that produced no response at all.
    fn send(&self, request: &DeleteRequest) -> LocalBoxFuture<'static, Result<TransportResponse, String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("HTTP {status}: {preview}")]
    Status { status: u16, preview: String },
    #[error("{0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Sends `request` and checks for a 2xx status with a JSON body.
pub async fn perform(
    transport: &dyn DeleteTransport,
    request: &DeleteRequest,
    preview_len: usize,
) -> Result<serde_json::Value, DeleteError> {
    let response = transport
        .send(request)
        .await
        .map_err(DeleteError::Transport)?;
    if !response.is_success() {
        return Err(DeleteError::Status {
            status: response.status,
            preview: preview(&response.body, preview_len),
        });
    }
    serde_json::from_str(&response.body).map_err(|error| DeleteError::Malformed(error.to_string()))
}

fn preview(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((end, _)) => body[..end].to_owned(),
        None => body.to_owned(),
    }
}
