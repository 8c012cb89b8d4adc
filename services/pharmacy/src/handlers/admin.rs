use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use validator::Validate;

use rxdesk_auth_types::identity::{AuthRejection, Identity, authorize};
use rxdesk_core::envelope::Envelope;
use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

use crate::domain::types::{
    DoctorDetails, PartnerDetails, PatientDetails, RoleDetails, StaffDetails, UserChanges,
    UserRecord,
};
use crate::error::{ApiError, FailWith, PharmacyServiceError};
use crate::handlers::auth::{AccountFields, AccountResponse};
use crate::handlers::validation::{ValidatedJson, validate_phone};
use crate::state::AppState;
use crate::usecase::account::USER_NOT_FOUND;
use crate::usecase::staff::{
    AddDoctorInput, AddDoctorUseCase, AddEmployeeInput, AddEmployeeUseCase, AddPartnerInput,
    AddPartnerUseCase, ListUsersByRoleUseCase, SetUserActiveUseCase, UpdateUserUseCase,
};

/// Route layer for `/api/v1/admin`: authenticated admins only.
pub async fn require_admin(
    identity: Identity,
    request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    authorize(Some(&identity), &[UserRole::Admin])?;
    Ok(next.run(request).await)
}

// ── Response shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorResponse {
    pub specialization: String,
    pub license_number: String,
    pub consultation_fee: f64,
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffResponse {
    pub employee_id: String,
    pub department: String,
    pub salary: f64,
    pub hire_date: chrono::NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerResponse {
    pub profit_share_percentage: f64,
    pub investment_amount: f64,
    pub join_date: chrono::NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DetailsResponse {
    Patient(PatientResponse),
    Doctor(DoctorResponse),
    Staff(StaffResponse),
    Partner(PartnerResponse),
}

/// A user joined with its role fields, all at the top level.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub details: Option<DetailsResponse>,
}

impl From<UserRecord> for UserResponse {
    fn from(r: UserRecord) -> Self {
        let details = match r.details {
            RoleDetails::Patient(PatientDetails {
                date_of_birth,
                address,
                emergency_contact,
                medical_history,
            }) => Some(DetailsResponse::Patient(PatientResponse {
                date_of_birth,
                address,
                emergency_contact,
                medical_history,
            })),
            RoleDetails::Doctor(DoctorDetails {
                specialization,
                license_number,
                consultation_fee,
                is_available,
            }) => Some(DetailsResponse::Doctor(DoctorResponse {
                specialization,
                license_number,
                consultation_fee,
                is_available,
            })),
            RoleDetails::Staff(StaffDetails {
                employee_id,
                department,
                salary,
                hire_date,
            }) => Some(DetailsResponse::Staff(StaffResponse {
                employee_id,
                department,
                salary,
                hire_date,
            })),
            RoleDetails::Partner(PartnerDetails {
                profit_share_percentage,
                investment_amount,
                join_date,
            }) => Some(DetailsResponse::Partner(PartnerResponse {
                profit_share_percentage,
                investment_amount,
                join_date,
            })),
            RoleDetails::Admin => None,
        };
        Self {
            account: r.account.into(),
            details,
        }
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, PharmacyServiceError> {
    raw.parse()
        .map_err(|_| PharmacyServiceError::NotFound(USER_NOT_FOUND.to_owned()))
}

// ── POST /api/v1/admin/doctors ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddDoctorRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub account: AccountFields,
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Specialization must be 2-100 characters long"))]
    pub specialization: String,
    #[serde(default)]
    #[validate(length(min = 3, max = 50, message = "License number must be 3-50 characters long"))]
    pub license_number: String,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "Consultation fee must be a positive number"))]
    pub consultation_fee: f64,
}

pub async fn add_doctor(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<AddDoctorRequest>,
) -> Result<Envelope<UserResponse>, ApiError> {
    let usecase = AddDoctorUseCase {
        repo: state.user_repo(),
    };
    let record = usecase
        .execute(AddDoctorInput {
            account: body.account.into(),
            specialization: body.specialization,
            license_number: body.license_number,
            consultation_fee: body.consultation_fee,
        })
        .await
        .fail_with("Failed to add doctor")?;
    Ok(Envelope::created("Doctor added successfully", record.into()))
}

// ── POST /api/v1/admin/employees ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddEmployeeRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub account: AccountFields,
    #[serde(default)]
    #[validate(length(min = 3, max = 20, message = "Employee ID must be 3-20 characters long"))]
    pub employee_id: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Department must be 2-50 characters long"))]
    pub department: String,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "Salary must be a positive number"))]
    pub salary: f64,
}

pub async fn add_employee(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<AddEmployeeRequest>,
) -> Result<Envelope<UserResponse>, ApiError> {
    let usecase = AddEmployeeUseCase {
        repo: state.user_repo(),
    };
    let record = usecase
        .execute(AddEmployeeInput {
            account: body.account.into(),
            employee_id: body.employee_id,
            department: body.department,
            salary: body.salary,
        })
        .await
        .fail_with("Failed to add employee")?;
    Ok(Envelope::created("Employee added successfully", record.into()))
}

// ── POST /api/v1/admin/partners ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddPartnerRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub account: AccountFields,
    #[serde(default)]
    #[validate(range(min = 0.01, max = 100.0, message = "Profit share must be between 0.01% and 100%"))]
    pub profit_share_percentage: f64,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "Investment amount must be a positive number"))]
    pub investment_amount: f64,
}

pub async fn add_partner(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<AddPartnerRequest>,
) -> Result<Envelope<UserResponse>, ApiError> {
    let usecase = AddPartnerUseCase {
        repo: state.user_repo(),
    };
    let record = usecase
        .execute(AddPartnerInput {
            account: body.account.into(),
            profit_share_percentage: body.profit_share_percentage,
            investment_amount: body.investment_amount,
        })
        .await
        .fail_with("Failed to add partner")?;
    Ok(Envelope::created("Partner added successfully", record.into()))
}

// ── GET /api/v1/admin/users/{role} ───────────────────────────────────────────

pub async fn list_users(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Envelope<Vec<UserResponse>>, ApiError> {
    const FAILED: &str = "Failed to retrieve users";

    let role: UserRole = role
        .parse()
        .map_err(|e: rxdesk_domain::user::UnknownRole| {
            PharmacyServiceError::Validation(format!("Invalid role: {}", e.0)).during(FAILED)
        })?;
    let usecase = ListUsersByRoleUseCase {
        repo: state.user_repo(),
    };
    let records = usecase.execute(role).await.fail_with(FAILED)?;
    Ok(Envelope::ok(
        format!("{role}s retrieved successfully"),
        records.into_iter().map(UserResponse::from).collect(),
    ))
}

// ── PUT /api/v1/admin/users/{id} ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters long"))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 50, message = "Last name must be 2-50 characters long"))]
    pub last_name: Option<String>,
    #[validate(custom(function = validate_phone))]
    pub phone: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Specialization must be 2-100 characters long"))]
    pub specialization: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Consultation fee must be a positive number"))]
    pub consultation_fee: Option<f64>,
    #[validate(length(min = 2, max = 50, message = "Department must be 2-50 characters long"))]
    pub department: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Salary must be a positive number"))]
    pub salary: Option<f64>,
    #[validate(range(min = 0.01, max = 100.0, message = "Profit share must be between 0.01% and 100%"))]
    pub profit_share_percentage: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Investment amount must be a positive number"))]
    pub investment_amount: Option<f64>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            phone: r.phone,
            specialization: r.specialization,
            consultation_fee: r.consultation_fee,
            department: r.department,
            salary: r.salary,
            profit_share_percentage: r.profit_share_percentage,
            investment_amount: r.investment_amount,
        }
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> Result<Envelope<UserResponse>, ApiError> {
    const FAILED: &str = "Failed to update user";

    let id = parse_user_id(&user_id).fail_with(FAILED)?;
    let usecase = UpdateUserUseCase {
        repo: state.user_repo(),
    };
    let record = usecase.execute(id, body.into()).await.fail_with(FAILED)?;
    Ok(Envelope::ok("User updated successfully", record.into()))
}

// ── PATCH /api/v1/admin/users/{id}/activate|deactivate ───────────────────────

pub async fn activate_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    set_active(&state, &user_id, true)
        .await
        .fail_with("Failed to activate user")?;
    Ok(Envelope::done("User activated successfully"))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    set_active(&state, &user_id, false)
        .await
        .fail_with("Failed to deactivate user")?;
    Ok(Envelope::done("User deactivated successfully"))
}

async fn set_active(
    state: &AppState,
    user_id: &str,
    active: bool,
) -> Result<(), PharmacyServiceError> {
    let id = parse_user_id(user_id)?;
    let usecase = SetUserActiveUseCase {
        repo: state.user_repo(),
    };
    usecase.execute(id, active).await
}
