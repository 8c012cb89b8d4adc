use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use rxdesk_core::envelope::Envelope;
use rxdesk_domain::schedule::WeeklySchedule;

use crate::domain::types::{PharmacyConfigRecord, PharmacySettings};
use crate::error::{ApiError, FailWith};
use crate::handlers::validation::{
    ValidatedJson, validate_currency, validate_phone, validate_working_hours,
};
use crate::state::AppState;
use crate::usecase::pharmacy_config::{GetPharmacyConfigUseCase, UpdatePharmacyConfigUseCase};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyConfigRequest {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Pharmacy name must be 2-100 characters long"))]
    pub pharmacy_name: String,
    #[serde(default)]
    #[validate(length(min = 10, max = 500, message = "Address must be 10-500 characters long"))]
    pub address: String,
    #[serde(default)]
    #[validate(custom(function = validate_phone))]
    pub phone: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 5, max = 50, message = "License number must be 5-50 characters long"))]
    pub license_number: String,
    #[serde(default)]
    #[validate(length(min = 5, max = 50, message = "Registration number must be 5-50 characters long"))]
    pub registration_number: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Owner name must be 2-100 characters long"))]
    pub owner_name: String,
    #[validate(
        required(message = "Working hours are required"),
        custom(function = validate_working_hours)
    )]
    pub working_hours: Option<WeeklySchedule>,
    #[serde(default)]
    #[validate(custom(function = validate_currency))]
    pub currency: String,
    #[validate(
        required(message = "Tax rate is required"),
        range(min = 0.0, max = 50.0, message = "Tax rate must be between 0% and 50%")
    )]
    pub tax_rate: Option<f64>,
}

impl PharmacyConfigRequest {
    /// Only called after validation, so the required fields are present.
    fn into_settings(self) -> Option<PharmacySettings> {
        Some(PharmacySettings {
            pharmacy_name: self.pharmacy_name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            license_number: self.license_number,
            registration_number: self.registration_number,
            owner_name: self.owner_name,
            working_hours: self.working_hours?,
            currency: self.currency.to_ascii_uppercase(),
            tax_rate: self.tax_rate?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyConfigResponse {
    pub id: i32,
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
    #[serde(serialize_with = "rxdesk_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "rxdesk_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PharmacyConfigRecord> for PharmacyConfigResponse {
    fn from(r: PharmacyConfigRecord) -> Self {
        let s = r.settings;
        Self {
            id: r.id,
            pharmacy_name: s.pharmacy_name,
            address: s.address,
            phone: s.phone,
            email: s.email,
            license_number: s.license_number,
            registration_number: s.registration_number,
            owner_name: s.owner_name,
            working_hours: s.working_hours,
            currency: s.currency,
            tax_rate: s.tax_rate,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// ── GET /api/v1/admin/config/pharmacy ────────────────────────────────────────

pub async fn get_config(
    State(state): State<AppState>,
) -> Result<Envelope<PharmacyConfigResponse>, ApiError> {
    let usecase = GetPharmacyConfigUseCase {
        repo: state.config_repo(),
    };
    let record = usecase
        .execute()
        .await
        .fail_with("Failed to retrieve pharmacy configuration")?;
    Ok(Envelope::ok(
        "Pharmacy configuration retrieved successfully",
        record.into(),
    ))
}

// ── POST|PUT /api/v1/admin/config/pharmacy ───────────────────────────────────

pub async fn save_config(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<PharmacyConfigRequest>,
) -> Result<Envelope<PharmacyConfigResponse>, ApiError> {
    let settings = body
        .into_settings()
        .ok_or_else(|| ApiError::validation("Working hours and tax rate are required"))?;
    let usecase = UpdatePharmacyConfigUseCase {
        repo: state.config_repo(),
    };
    let record = usecase
        .execute(settings)
        .await
        .fail_with("Failed to update pharmacy configuration")?;
    Ok(Envelope::ok(
        "Pharmacy configuration updated successfully",
        record.into(),
    ))
}
