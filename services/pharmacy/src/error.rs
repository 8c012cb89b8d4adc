use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use rxdesk_core::envelope::{Envelope, internal_detail};

/// Pharmacy service error variants.
///
/// Every variant except `Internal` carries the client-facing detail that ends
/// up in the envelope's `error` field.
#[derive(Debug, thiserror::Error)]
pub enum PharmacyServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl PharmacyServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the envelope's `error` field.
    pub fn detail(&self) -> String {
        match self {
            Self::Internal(e) => internal_detail(e),
            other => other.to_string(),
        }
    }

    /// Attach the name of the failed operation, e.g. "Failed to add doctor".
    pub fn during(self, operation: &'static str) -> ApiError {
        ApiError {
            operation,
            source: self,
        }
    }
}

/// A [`PharmacyServiceError`] rendered at the HTTP boundary.
///
/// Body: `{ "success": false, "message": <operation>, "error": <detail> }`.
#[derive(Debug)]
pub struct ApiError {
    pub operation: &'static str,
    pub source: PharmacyServiceError,
}

impl ApiError {
    pub fn validation(detail: impl Into<String>) -> Self {
        PharmacyServiceError::Validation(detail.into()).during("Validation failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let PharmacyServiceError::Internal(ref e) = self.source {
            tracing::error!(error = ?e, kind = "INTERNAL", operation = self.operation, "internal error");
        } else {
            tracing::debug!(
                kind = self.source.kind(),
                operation = self.operation,
                detail = %self.source,
                "request failed"
            );
        }
        Envelope::failure(
            self.source.status(),
            self.operation,
            Some(self.source.detail()),
        )
        .into_response()
    }
}

/// `result.fail_with("Failed to add doctor")?` in handlers.
pub trait FailWith<T> {
    fn fail_with(self, operation: &'static str) -> Result<T, ApiError>;
}

impl<T> FailWith<T> for Result<T, PharmacyServiceError> {
    fn fail_with(self, operation: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| e.during(operation))
    }
}
