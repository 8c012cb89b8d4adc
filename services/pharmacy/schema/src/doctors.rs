use sea_orm::entity::prelude::*;

/// Doctor details. License numbers are unique across all doctors.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "doctors")]
pub struct Model {
    /// Same key as the owning `users` row.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub specialization: String,
    #[sea_orm(unique)]
    pub license_number: String,
    pub consultation_fee: f64,
    pub is_available: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::Id",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
