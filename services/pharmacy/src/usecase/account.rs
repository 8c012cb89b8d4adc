use anyhow::Context as _;
use chrono::Utc;

use rxdesk_auth_types::token::{IssuedToken, TokenKeys, TokenSubject};
use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{
    Account, EMAIL_TAKEN, NewUser, RoleDetails, UserRecord, ensure_profit_share_fits,
};
use crate::error::PharmacyServiceError;
use crate::infra::password::{hash_password, verify_password};

/// Shared by every failed login so callers cannot tell which check failed.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const USER_NOT_FOUND: &str = "User not found";

/// Base account fields collected by every provisioning path.
#[derive(Debug, Clone)]
pub struct NewAccountInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

pub(crate) async fn ensure_email_free<R: UserRepository>(
    repo: &R,
    email: &str,
) -> Result<(), PharmacyServiceError> {
    if repo.email_exists(email).await? {
        return Err(PharmacyServiceError::Conflict(EMAIL_TAKEN.to_owned()));
    }
    Ok(())
}

/// Hash the password and insert the account with `details` as one unit.
pub(crate) async fn insert_user<R: UserRepository>(
    repo: &R,
    input: NewAccountInput,
    details: RoleDetails,
) -> Result<UserRecord, PharmacyServiceError> {
    let password_hash = hash_password(&input.password).await?;
    let user = NewUser {
        id: UserId::generate(),
        email: input.email,
        password_hash,
        first_name: input.first_name,
        last_name: input.last_name,
        phone: input.phone,
        details,
        created_at: Utc::now(),
    };
    let record = repo.create(&user).await?;
    tracing::info!(
        user_id = %record.account.id,
        role = %record.account.role,
        "user provisioned"
    );
    Ok(record)
}

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub account: NewAccountInput,
    pub role: UserRole,
}

/// Self-registration. Role fields are filled with placeholder values.
pub struct CreateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> CreateUserUseCase<R> {
    pub async fn execute(&self, input: CreateUserInput) -> Result<UserRecord, PharmacyServiceError> {
        ensure_email_free(&self.repo, &input.account.email).await?;
        let details = RoleDetails::self_registered(input.role, Utc::now().date_naive());
        if let RoleDetails::Partner(ref partner) = details {
            let current = self.repo.total_profit_share(None).await?;
            ensure_profit_share_fits(current, partner.profit_share_percentage)?;
        }
        insert_user(&self.repo, input.account, details).await
    }
}

// ── Authenticate ─────────────────────────────────────────────────────────────

/// Signed token plus the account it was issued for.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account: Account,
    pub token: IssuedToken,
}

pub fn open_session(
    keys: &TokenKeys,
    account: Account,
) -> Result<AuthSession, PharmacyServiceError> {
    let token = keys
        .issue(TokenSubject {
            user_id: account.id,
            email: &account.email,
            role: account.role,
        })
        .context("issue access token")?;
    Ok(AuthSession { account, token })
}

pub struct AuthenticateUseCase<R: UserRepository> {
    pub repo: R,
    pub keys: TokenKeys,
}

impl<R: UserRepository> AuthenticateUseCase<R> {
    pub async fn execute(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, PharmacyServiceError> {
        let invalid = || PharmacyServiceError::Unauthorized(INVALID_CREDENTIALS.to_owned());

        let credentials = self
            .repo
            .find_credentials_by_email(email)
            .await?
            .filter(|c| c.account.is_active)
            .ok_or_else(invalid)?;
        if !verify_password(password, &credentials.password_hash).await {
            return Err(invalid());
        }
        open_session(&self.keys, credentials.account)
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

/// Active account by id. Deactivated accounts read as absent.
pub struct GetUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> GetUserUseCase<R> {
    pub async fn execute(&self, id: UserId) -> Result<Account, PharmacyServiceError> {
        self.repo
            .find_account(id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| PharmacyServiceError::NotFound(USER_NOT_FOUND.to_owned()))
    }
}
