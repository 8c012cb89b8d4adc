use sea_orm::entity::prelude::*;

/// Key of the only row the table may hold.
pub const SINGLETON_ID: i32 = 1;

/// Whole-pharmacy settings. At most one row, keyed by [`SINGLETON_ID`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pharmacy_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub pharmacy_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub license_number: String,
    pub registration_number: String,
    pub owner_name: String,
    /// JSON text of the weekly schedule.
    pub working_hours: String,
    pub currency: String,
    pub tax_rate: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
