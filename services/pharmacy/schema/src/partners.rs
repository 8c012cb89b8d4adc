use sea_orm::entity::prelude::*;

/// Partner details. The sum of all shares is kept at or below 100.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "partners")]
pub struct Model {
    /// Same key as the owning `users` row.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub profit_share_percentage: f64,
    pub investment_amount: f64,
    pub join_date: chrono::NaiveDate,
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
