#![allow(async_fn_in_trait)]

use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

use crate::domain::types::{
    Account, Credentials, NewUser, PharmacyConfigRecord, PharmacySettings, UserChanges,
    UserRecord,
};
use crate::error::PharmacyServiceError;

/// Repository for accounts and their satellite rows.
pub trait UserRepository: Send + Sync {
    /// Look up an account by email regardless of its active flag.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials>, PharmacyServiceError>;

    async fn find_account(&self, id: UserId) -> Result<Option<Account>, PharmacyServiceError>;

    async fn find_record(&self, id: UserId) -> Result<Option<UserRecord>, PharmacyServiceError>;

    async fn email_exists(&self, email: &str) -> Result<bool, PharmacyServiceError>;

    async fn license_number_exists(&self, license_number: &str)
    -> Result<bool, PharmacyServiceError>;

    async fn employee_id_exists(&self, employee_id: &str) -> Result<bool, PharmacyServiceError>;

    /// Sum of all partner shares, optionally leaving one partner out.
    async fn total_profit_share(
        &self,
        excluding: Option<UserId>,
    ) -> Result<f64, PharmacyServiceError>;

    /// Insert the account and its satellite row as one unit.
    ///
    /// Partner rows are re-checked against the profit-share cap inside the
    /// same unit, serialized with every other partner write. Unique
    /// violations surface as `Conflict`.
    async fn create(&self, user: &NewUser) -> Result<UserRecord, PharmacyServiceError>;

    /// Users with `role`, inactive ones included, newest first.
    async fn list_by_role(&self, role: UserRole) -> Result<Vec<UserRecord>, PharmacyServiceError>;

    /// Apply `changes` and return the updated record, or `None` for an
    /// unknown id. Share changes are checked against the cap like `create`.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<UserRecord>, PharmacyServiceError>;

    /// Set the active flag. Returns `false` if no user has this id.
    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, PharmacyServiceError>;
}

/// Repository for the singleton pharmacy configuration.
pub trait PharmacyConfigRepository: Send + Sync {
    async fn get(&self) -> Result<Option<PharmacyConfigRecord>, PharmacyServiceError>;

    /// Create the row on first write, replace it in place afterwards.
    async fn upsert(
        &self,
        settings: &PharmacySettings,
    ) -> Result<PharmacyConfigRecord, PharmacyServiceError>;
}
