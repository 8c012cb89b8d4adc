use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Partners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Partners::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Partners::ProfitSharePercentage)
                            .double()
                            .not_null()
                            .check(Expr::col(Partners::ProfitSharePercentage).between(0.0, 100.0)),
                    )
                    .col(ColumnDef::new(Partners::InvestmentAmount).double().not_null())
                    .col(ColumnDef::new(Partners::JoinDate).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Partners::Table, Partners::Id)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Partners::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Partners {
    Table,
    Id,
    ProfitSharePercentage,
    InvestmentAmount,
    JoinDate,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
