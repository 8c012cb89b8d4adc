use std::sync::OnceLock;
use std::time::Instant;

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// Record process start for the uptime figure. Later calls are ignored.
pub fn mark_started() {
    STARTED_AT.get_or_init(Instant::now);
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    #[serde(serialize_with = "crate::serde::to_rfc3339_ms")]
    pub timestamp: DateTime<Utc>,
    /// Seconds since [`mark_started`].
    pub uptime: f64,
}

/// Handler for `GET /health`: liveness check.
pub async fn health() -> Json<HealthStatus> {
    let started = STARTED_AT.get_or_init(Instant::now);
    Json(HealthStatus {
        status: "OK",
        timestamp: Utc::now(),
        uptime: started.elapsed().as_secs_f64(),
    })
}
