use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use rxdesk_core::health::health;
use rxdesk_core::middleware::{
    propagate_request_id_layer, request_id_layer, with_security_headers,
};

use crate::handlers::{
    admin::{
        activate_user, add_doctor, add_employee, add_partner, deactivate_user, list_users,
        require_admin, update_user,
    },
    auth::{login, profile, register},
    pharmacy_config::{get_config, save_config},
    system::{banner, not_found, readyz},
    validation::MAX_BODY_BYTES,
};
use crate::config::RateLimit;
use crate::state::AppState;

/// How often idle clients are dropped from the limiter.
const RATE_LIMIT_SWEEP: Duration = Duration::from_secs(60);

/// With `rate_limit` set, `/api/v1` requests are limited per peer address, so
/// they must carry `ConnectInfo<SocketAddr>`: serve with
/// `into_make_service_with_connect_info`. Must be called inside a Tokio runtime.
pub fn build_router(
    state: AppState,
    allowed_origins: &[String],
    rate_limit: Option<RateLimit>,
) -> Router {
    // `{id}` is a role name on GET and a user id on PUT.
    let admin = Router::new()
        // Provisioning
        .route("/doctors", post(add_doctor))
        .route("/employees", post(add_employee))
        .route("/partners", post(add_partner))
        // Users
        .route("/users/{id}", get(list_users).put(update_user))
        .route("/users/{id}/activate", patch(activate_user))
        .route("/users/{id}/deactivate", patch(deactivate_user))
        // Pharmacy configuration
        .route(
            "/config/pharmacy",
            get(get_config).post(save_config).put(save_config),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let mut api = Router::new()
        .route("/api/v1", get(banner))
        // Auth
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/profile", get(profile))
        // Admin
        .nest("/api/v1/admin", admin);
    if let Some(limit) = rate_limit {
        api = rate_limited(api, limit);
    }

    let router = Router::new()
        // Health
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        .merge(api)
        .fallback(not_found)
        .with_state(state);

    with_security_headers(router)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(allowed_origins))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Limit `api` per peer address: a full burst of `max_requests`, then one slot
/// back every `window / max_requests`.
fn rate_limited<S>(api: Router<S>, limit: RateLimit) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let config = limit
        .window
        .checked_div(limit.max_requests)
        .map(|period| period.max(Duration::from_nanos(1)))
        .and_then(|period| {
            GovernorConfigBuilder::default()
                .period(period)
                .burst_size(limit.max_requests)
                .finish()
        });
    let Some(config) = config else {
        tracing::warn!(?limit, "invalid rate limit, requests are not limited");
        return api;
    };
    let config = Arc::new(config);

    let limiter = Arc::downgrade(config.limiter());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP);
        loop {
            interval.tick().await;
            let Some(limiter) = limiter.upgrade() else {
                break;
            };
            limiter.retain_recent();
        }
    });

    api.layer(GovernorLayer { config })
}
