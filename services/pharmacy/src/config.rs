use std::time::Duration;

use anyhow::{Context as _, bail, ensure};

use rxdesk_auth_types::token::DEFAULT_TOKEN_TTL_SECS;

const DEFAULT_DATABASE_URL: &str = "sqlite://pharmacy_management.db?mode=rwc";
const DEFAULT_PORT: u16 = 5000;
/// One year.
const MAX_TOKEN_TTL_SECS: u64 = 31_536_000;
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:5174",
];

/// Credentials of the administrator created at startup when none exists.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Per-client request budget for the `/api/v1` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

/// Pharmacy service configuration loaded from environment variables.
#[derive(Debug)]
pub struct PharmacyConfig {
    /// sea-orm connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// HMAC secret for signing access tokens. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// Access token lifetime (default 7 days). Env var: `JWT_TTL_SECS`.
    pub jwt_ttl_secs: u64,
    /// TCP port for the HTTP server (default 5000). Env var: `PORT`.
    pub port: u16,
    /// `development` or `production` (default). Env var: `APP_ENV`.
    pub app_env: String,
    /// Browser origins allowed by CORS. Env var: `CORS_ORIGINS`, comma separated.
    pub cors_origins: Vec<String>,
    /// Env vars: `ADMIN_EMAIL` and `ADMIN_PASSWORD`, both or neither.
    pub admin_seed: Option<AdminSeed>,
    /// Default 100 requests per 15 minutes. Env vars: `RATE_LIMIT_MAX`
    /// (`0` disables) and `RATE_LIMIT_WINDOW_SECS`.
    pub rate_limit: Option<RateLimit>,
}

impl PharmacyConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_ttl_secs = match var("JWT_TTL_SECS") {
            Some(v) => v.parse().context("JWT_TTL_SECS must be a number of seconds")?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        ensure!(
            (1..=MAX_TOKEN_TTL_SECS).contains(&jwt_ttl_secs),
            "JWT_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}"
        );
        let port = match var("PORT") {
            Some(v) => v.parse().context("PORT must be a TCP port")?,
            None => DEFAULT_PORT,
        };
        let cors_origins = match var("CORS_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_owned)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.map(str::to_owned).to_vec(),
        };
        let admin_seed = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };
        let max_requests = match var("RATE_LIMIT_MAX") {
            Some(v) => v.parse().context("RATE_LIMIT_MAX must be a request count")?,
            None => DEFAULT_RATE_LIMIT_MAX,
        };
        let window_secs = match var("RATE_LIMIT_WINDOW_SECS") {
            Some(v) => v
                .parse()
                .context("RATE_LIMIT_WINDOW_SECS must be a number of seconds")?,
            None => DEFAULT_RATE_LIMIT_WINDOW_SECS,
        };
        ensure!(window_secs > 0, "RATE_LIMIT_WINDOW_SECS must be positive");
        let rate_limit = (max_requests > 0).then(|| RateLimit {
            max_requests,
            window: Duration::from_secs(window_secs),
        });

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            jwt_secret,
            jwt_ttl_secs,
            port,
            app_env: var("APP_ENV").unwrap_or_else(|| "production".to_owned()),
            cors_origins,
            admin_seed,
            rate_limit,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
