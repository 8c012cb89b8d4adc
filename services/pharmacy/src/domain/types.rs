use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use rxdesk_domain::id::UserId;
use rxdesk_domain::schedule::WeeklySchedule;
use rxdesk_domain::user::UserRole;

use crate::error::PharmacyServiceError;

/// Upper bound for the combined profit share of all partners, in percent.
pub const PROFIT_SHARE_CAP: f64 = 100.0;

// Shares are stored as floating point; 33.33 + 33.33 + 33.34 must still fit.
const PROFIT_SHARE_TOLERANCE: f64 = 1e-9;

pub const EMAIL_TAKEN: &str = "User with this email already exists";
pub const LICENSE_NUMBER_TAKEN: &str = "Doctor with this license number already exists";
pub const EMPLOYEE_ID_TAKEN: &str = "Employee with this ID already exists";

/// Defaults written for role fields when an account is created through
/// self-registration, which collects no role-specific data.
pub mod self_registered {
    pub const DOCTOR_SPECIALIZATION: &str = "General Medicine";
    pub const DOCTOR_LICENSE_PREFIX: &str = "PENDING-";
    pub const DOCTOR_CONSULTATION_FEE: f64 = 500.0;

    pub const EMPLOYEE_ID_PREFIX: &str = "EMP-";
    pub const EMPLOYEE_DEPARTMENT: &str = "Pharmacy";
    pub const EMPLOYEE_SALARY: f64 = 25_000.0;

    pub const PARTNER_PROFIT_SHARE: f64 = 10.0;
    pub const PARTNER_INVESTMENT: f64 = 50_000.0;
}

/// Base account fields shared by every role. Never carries the password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account plus its stored password hash, used only for login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account: Account,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientDetails {
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorDetails {
    pub specialization: String,
    pub license_number: String,
    pub consultation_fee: f64,
    pub is_available: bool,
}

/// Employee record backing the `pharmacist` role.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffDetails {
    pub employee_id: String,
    pub department: String,
    pub salary: f64,
    pub hire_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartnerDetails {
    pub profit_share_percentage: f64,
    pub investment_amount: f64,
    pub join_date: NaiveDate,
}

/// Role-specific part of a user. Each variant maps to one satellite table,
/// except `Admin` which has none.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleDetails {
    Patient(PatientDetails),
    Doctor(DoctorDetails),
    Staff(StaffDetails),
    Partner(PartnerDetails),
    Admin,
}

impl RoleDetails {
    pub fn role(&self) -> UserRole {
        match self {
            Self::Patient(_) => UserRole::Patient,
            Self::Doctor(_) => UserRole::Doctor,
            Self::Staff(_) => UserRole::Pharmacist,
            Self::Partner(_) => UserRole::Partner,
            Self::Admin => UserRole::Admin,
        }
    }

    /// Placeholder details for a self-registered account of `role`.
    ///
    /// License numbers and employee ids get a random suffix so they stay
    /// unique across placeholder rows.
    pub fn self_registered(role: UserRole, today: NaiveDate) -> Self {
        use self_registered::*;

        let suffix = || Uuid::new_v4().simple().to_string()[..12].to_uppercase();
        match role {
            UserRole::Patient => Self::Patient(PatientDetails::default()),
            UserRole::Doctor => Self::Doctor(DoctorDetails {
                specialization: DOCTOR_SPECIALIZATION.to_owned(),
                license_number: format!("{DOCTOR_LICENSE_PREFIX}{}", suffix()),
                consultation_fee: DOCTOR_CONSULTATION_FEE,
                is_available: true,
            }),
            UserRole::Pharmacist => Self::Staff(StaffDetails {
                employee_id: format!("{EMPLOYEE_ID_PREFIX}{}", suffix()),
                department: EMPLOYEE_DEPARTMENT.to_owned(),
                salary: EMPLOYEE_SALARY,
                hire_date: today,
            }),
            UserRole::Partner => Self::Partner(PartnerDetails {
                profit_share_percentage: PARTNER_PROFIT_SHARE,
                investment_amount: PARTNER_INVESTMENT,
                join_date: today,
            }),
            UserRole::Admin => Self::Admin,
        }
    }
}

/// A user joined with its satellite row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub account: Account,
    pub details: RoleDetails,
}

/// Everything needed to insert a user and its satellite row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub details: RoleDetails,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a user. `None` leaves the stored value untouched;
/// role fields that do not belong to the user's role are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub consultation_fee: Option<f64>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    pub profit_share_percentage: Option<f64>,
    pub investment_amount: Option<f64>,
}

/// Reject a partner share that would take the combined total above
/// [`PROFIT_SHARE_CAP`]. `current_total` must exclude the partner being
/// updated, if any.
pub fn ensure_profit_share_fits(
    current_total: f64,
    requested: f64,
) -> Result<(), PharmacyServiceError> {
    if current_total + requested > PROFIT_SHARE_CAP + PROFIT_SHARE_TOLERANCE {
        return Err(PharmacyServiceError::Conflict(format!(
            "Total profit share would exceed {PROFIT_SHARE_CAP}%. Current total: {current_total}%"
        )));
    }
    Ok(())
}

/// Whole-pharmacy settings as submitted by an administrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PharmacySettings {
    pub pharmacy_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub license_number: String,
    pub registration_number: String,
    pub owner_name: String,
    pub working_hours: WeeklySchedule,
    pub currency: String,
    pub tax_rate: f64,
}

/// The stored singleton configuration row.
#[derive(Debug, Clone, PartialEq)]
pub struct PharmacyConfigRecord {
    pub id: i32,
    pub settings: PharmacySettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
