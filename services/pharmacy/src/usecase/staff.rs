use chrono::Utc;

use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{
    DoctorDetails, EMPLOYEE_ID_TAKEN, LICENSE_NUMBER_TAKEN, PartnerDetails, RoleDetails,
    StaffDetails, UserChanges, UserRecord, ensure_profit_share_fits,
};
use crate::error::PharmacyServiceError;
use crate::usecase::account::{NewAccountInput, USER_NOT_FOUND, ensure_email_free, insert_user};

fn user_not_found() -> PharmacyServiceError {
    PharmacyServiceError::NotFound(USER_NOT_FOUND.to_owned())
}

// ── AddDoctor ────────────────────────────────────────────────────────────────

pub struct AddDoctorInput {
    pub account: NewAccountInput,
    pub specialization: String,
    pub license_number: String,
    pub consultation_fee: f64,
}

pub struct AddDoctorUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> AddDoctorUseCase<R> {
    pub async fn execute(&self, input: AddDoctorInput) -> Result<UserRecord, PharmacyServiceError> {
        ensure_email_free(&self.repo, &input.account.email).await?;
        if self.repo.license_number_exists(&input.license_number).await? {
            return Err(PharmacyServiceError::Conflict(
                LICENSE_NUMBER_TAKEN.to_owned(),
            ));
        }
        let details = RoleDetails::Doctor(DoctorDetails {
            specialization: input.specialization,
            license_number: input.license_number,
            consultation_fee: input.consultation_fee,
            is_available: true,
        });
        insert_user(&self.repo, input.account, details).await
    }
}

// ── AddEmployee ──────────────────────────────────────────────────────────────

pub struct AddEmployeeInput {
    pub account: NewAccountInput,
    pub employee_id: String,
    pub department: String,
    pub salary: f64,
}

/// Provisions a `pharmacist` account backed by a staff row hired today.
pub struct AddEmployeeUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> AddEmployeeUseCase<R> {
    pub async fn execute(
        &self,
        input: AddEmployeeInput,
    ) -> Result<UserRecord, PharmacyServiceError> {
        ensure_email_free(&self.repo, &input.account.email).await?;
        if self.repo.employee_id_exists(&input.employee_id).await? {
            return Err(PharmacyServiceError::Conflict(EMPLOYEE_ID_TAKEN.to_owned()));
        }
        let details = RoleDetails::Staff(StaffDetails {
            employee_id: input.employee_id,
            department: input.department,
            salary: input.salary,
            hire_date: Utc::now().date_naive(),
        });
        insert_user(&self.repo, input.account, details).await
    }
}

// ── AddPartner ───────────────────────────────────────────────────────────────

pub struct AddPartnerInput {
    pub account: NewAccountInput,
    pub profit_share_percentage: f64,
    pub investment_amount: f64,
}

pub struct AddPartnerUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> AddPartnerUseCase<R> {
    /// The share is checked here to fail before hashing, and again by the
    /// repository inside the insert.
    pub async fn execute(&self, input: AddPartnerInput) -> Result<UserRecord, PharmacyServiceError> {
        ensure_email_free(&self.repo, &input.account.email).await?;
        let current = self.repo.total_profit_share(None).await?;
        ensure_profit_share_fits(current, input.profit_share_percentage)?;
        let details = RoleDetails::Partner(PartnerDetails {
            profit_share_percentage: input.profit_share_percentage,
            investment_amount: input.investment_amount,
            join_date: Utc::now().date_naive(),
        });
        insert_user(&self.repo, input.account, details).await
    }
}

// ── ListUsersByRole ──────────────────────────────────────────────────────────

pub struct ListUsersByRoleUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> ListUsersByRoleUseCase<R> {
    pub async fn execute(&self, role: UserRole) -> Result<Vec<UserRecord>, PharmacyServiceError> {
        self.repo.list_by_role(role).await
    }
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

pub struct UpdateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UpdateUserUseCase<R> {
    pub async fn execute(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<UserRecord, PharmacyServiceError> {
        let account = self.repo.find_account(id).await?.ok_or_else(user_not_found)?;
        if account.role == UserRole::Partner {
            if let Some(share) = changes.profit_share_percentage {
                let others = self.repo.total_profit_share(Some(id)).await?;
                ensure_profit_share_fits(others, share)?;
            }
        }
        let record = self
            .repo
            .update(id, &changes)
            .await?
            .ok_or_else(user_not_found)?;
        tracing::info!(user_id = %id, role = %record.account.role, "user updated");
        Ok(record)
    }
}

// ── SetUserActive ────────────────────────────────────────────────────────────

/// Activate or deactivate an account. Repeating a call is a no-op.
pub struct SetUserActiveUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> SetUserActiveUseCase<R> {
    pub async fn execute(&self, id: UserId, active: bool) -> Result<(), PharmacyServiceError> {
        if !self.repo.set_active(id, active).await? {
            return Err(user_not_found());
        }
        tracing::info!(user_id = %id, active, "user active flag set");
        Ok(())
    }
}
