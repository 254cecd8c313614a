//! Supabase error handling.

use reqwest::{Response, StatusCode};
use serde::Deserialize;

use quicknotes_core::{Error, Result};

/// Error body shapes returned by PostgREST (`message`) and GoTrue
/// (`msg`, `error_description`, `error`).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Extract a human-readable message from an error response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no details".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

/// Map a non-success status to a QuickNotes error.
pub fn status_error(status: StatusCode, body: &str) -> Error {
    let message = error_message(body);
    match status.as_u16() {
        401 | 403 => Error::Unauthorized(message),
        404 => Error::Backend(format!("not found: {}", message)),
        code => Error::Backend(format!("{}: {}", code, message)),
    }
}

/// Pass successful responses through; turn failures into errors.
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "Backend returned an error");
    Err(status_error(status, &body))
}
