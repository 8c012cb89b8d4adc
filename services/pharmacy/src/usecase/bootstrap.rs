use crate::domain::repository::UserRepository;
use crate::domain::types::RoleDetails;
use crate::error::PharmacyServiceError;
use crate::usecase::account::{NewAccountInput, insert_user};

pub const SEED_ADMIN_FIRST_NAME: &str = "System";
pub const SEED_ADMIN_LAST_NAME: &str = "Administrator";

/// Ensures an administrator exists for the configured email at startup.
pub struct SeedAdminUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> SeedAdminUseCase<R> {
    /// Returns `true` when a new admin was created, `false` when the email
    /// was already taken.
    pub async fn execute(&self, email: &str, password: &str) -> Result<bool, PharmacyServiceError> {
        if self.repo.email_exists(email).await? {
            tracing::debug!(email, "admin seed skipped, email already registered");
            return Ok(false);
        }
        let account = NewAccountInput {
            email: email.to_owned(),
            password: password.to_owned(),
            first_name: SEED_ADMIN_FIRST_NAME.to_owned(),
            last_name: SEED_ADMIN_LAST_NAME.to_owned(),
            phone: None,
        };
        insert_user(&self.repo, account, RoleDetails::Admin).await?;
        Ok(true)
    }
}
