use crate::domain::repository::PharmacyConfigRepository;
use crate::domain::types::{PharmacyConfigRecord, PharmacySettings};
use crate::error::PharmacyServiceError;

pub const CONFIG_NOT_FOUND: &str = "Pharmacy configuration not found";

// ── GetPharmacyConfig ────────────────────────────────────────────────────────

pub struct GetPharmacyConfigUseCase<R: PharmacyConfigRepository> {
    pub repo: R,
}

impl<R: PharmacyConfigRepository> GetPharmacyConfigUseCase<R> {
    pub async fn execute(&self) -> Result<PharmacyConfigRecord, PharmacyServiceError> {
        self.repo
            .get()
            .await?
            .ok_or_else(|| PharmacyServiceError::NotFound(CONFIG_NOT_FOUND.to_owned()))
    }
}

// ── UpdatePharmacyConfig ─────────────────────────────────────────────────────

pub struct UpdatePharmacyConfigUseCase<R: PharmacyConfigRepository> {
    pub repo: R,
}

impl<R: PharmacyConfigRepository> UpdatePharmacyConfigUseCase<R> {
    pub async fn execute(
        &self,
        settings: PharmacySettings,
    ) -> Result<PharmacyConfigRecord, PharmacyServiceError> {
        let record = self.repo.upsert(&settings).await?;
        tracing::info!(pharmacy = %record.settings.pharmacy_name, "pharmacy configuration saved");
        Ok(record)
    }
}
