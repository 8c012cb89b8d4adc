use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use rxdesk_auth_types::identity::Identity;
use rxdesk_core::envelope::Envelope;
use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

use crate::domain::types::Account;
use crate::error::{ApiError, FailWith};
use crate::handlers::validation::{ValidatedJson, validate_phone, validate_self_service_role};
use crate::state::AppState;
use crate::usecase::account::{
    AuthSession, AuthenticateUseCase, CreateUserInput, CreateUserUseCase, GetUserUseCase,
    NewAccountInput, open_session,
};

/// Base account fields, flattened into every admin provisioning body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountFields {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters long"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Last name must be 2-50 characters long"))]
    pub last_name: String,
    #[validate(custom(function = validate_phone))]
    pub phone: Option<String>,
}

impl From<AccountFields> for NewAccountInput {
    fn from(f: AccountFields) -> Self {
        Self {
            email: f.email,
            password: f.password,
            first_name: f.first_name,
            last_name: f.last_name,
            phone: f.phone,
        }
    }
}

/// Account without its password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(serialize_with = "rxdesk_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "rxdesk_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            first_name: a.first_name,
            last_name: a.last_name,
            phone: a.phone,
            role: a.role,
            is_active: a.is_active,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: AccountResponse,
    pub token: String,
    /// Seconds since the Unix epoch.
    pub expires_at: u64,
}

impl From<AuthSession> for SessionResponse {
    fn from(s: AuthSession) -> Self {
        Self {
            user: s.account.into(),
            token: s.token.token,
            expires_at: s.token.expires_at,
        }
    }
}

// ── POST /api/v1/auth/register ───────────────────────────────────────────────

/// Public sign-up. Names only need to be present; admin provisioning is stricter.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters long"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Last name must be 1-50 characters long"))]
    pub last_name: String,
    #[validate(custom(function = validate_phone))]
    pub phone: Option<String>,
    /// Defaults to `patient`.
    #[validate(custom(function = validate_self_service_role))]
    pub role: Option<UserRole>,
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<Envelope<SessionResponse>, ApiError> {
    const FAILED: &str = "Registration failed";

    let usecase = CreateUserUseCase {
        repo: state.user_repo(),
    };
    let record = usecase
        .execute(CreateUserInput {
            account: NewAccountInput {
                email: body.email,
                password: body.password,
                first_name: body.first_name,
                last_name: body.last_name,
                phone: body.phone,
            },
            role: body.role.unwrap_or(UserRole::Patient),
        })
        .await
        .fail_with(FAILED)?;
    let session = open_session(&state.token_keys, record.account).fail_with(FAILED)?;
    Ok(Envelope::created(
        "User registered successfully",
        session.into(),
    ))
}

// ── POST /api/v1/auth/login ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Envelope<SessionResponse>, ApiError> {
    let usecase = AuthenticateUseCase {
        repo: state.user_repo(),
        keys: state.token_keys.clone(),
    };
    let session = usecase
        .execute(&body.email, &body.password)
        .await
        .fail_with("Login failed")?;
    Ok(Envelope::ok("Login successful", session.into()))
}

// ── GET /api/v1/auth/profile ─────────────────────────────────────────────────

pub async fn profile(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Envelope<AccountResponse>, ApiError> {
    let usecase = GetUserUseCase {
        repo: state.user_repo(),
    };
    let account = usecase
        .execute(identity.user_id)
        .await
        .fail_with("Failed to retrieve profile")?;
    Ok(Envelope::ok("Profile retrieved successfully", account.into()))
}
