//! HTTP plumbing shared by Rxdesk services.
//!
//! Provides the uniform response envelope, liveness probe, request-id layer,
//! tracing initialisation and chrono serde helpers.

pub mod envelope;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
