use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use serde::Serialize;

use rxdesk_core::envelope::Envelope;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
    pub version: &'static str,
}

/// Handler for `GET /api/v1`.
pub async fn banner() -> Json<Banner> {
    Json(Banner {
        message: "Pharmacy Management System API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler for `GET /readyz`: 200 only while the store answers.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Router fallback for unmatched paths.
pub async fn not_found(uri: Uri) -> Envelope<()> {
    Envelope::failure(
        StatusCode::NOT_FOUND,
        format!("Route {} not found", uri.path()),
        None,
    )
}
