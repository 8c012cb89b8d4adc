//! Uniform JSON envelope returned by every endpoint.
//!
//! ```json
//! { "success": true, "message": "Login successful", "data": { ... } }
//! { "success": false, "message": "Failed to add doctor", "error": "..." }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

static EXPOSE_INTERNAL_DETAIL: AtomicBool = AtomicBool::new(false);

/// Opt in to returning the full error chain of 500 responses to clients.
/// Call once at startup; only development builds should enable it.
pub fn expose_internal_detail(enabled: bool) {
    EXPOSE_INTERNAL_DETAIL.store(enabled, Ordering::Relaxed);
}

/// Client-facing text for an internal error.
pub fn internal_detail(err: &anyhow::Error) -> String {
    if EXPOSE_INTERNAL_DETAIL.load(Ordering::Relaxed) {
        format!("{err:?}")
    } else {
        "internal error".to_owned()
    }
}

/// Serialized body of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeBody<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Envelope plus the HTTP status it is sent with.
#[derive(Debug)]
pub struct Envelope<T> {
    pub status: StatusCode,
    pub body: EnvelopeBody<T>,
}

impl<T> Envelope<T> {
    /// 200 with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, Some(data))
    }

    /// 201 with the created resource.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::CREATED, message, Some(data))
    }

    fn success(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status,
            body: EnvelopeBody {
                success: true,
                message: message.into(),
                data,
                error: None,
            },
        }
    }
}

impl Envelope<()> {
    /// 200 without a payload.
    pub fn done(message: impl Into<String>) -> Self {
        Self::success(StatusCode::OK, message, None)
    }

    /// Failure envelope. `error` is omitted from the body when `None`.
    pub fn failure(status: StatusCode, message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            status,
            body: EnvelopeBody {
                success: false,
                message: message.into(),
                data: None,
                error,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}
