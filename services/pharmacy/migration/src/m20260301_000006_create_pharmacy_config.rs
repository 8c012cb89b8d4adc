use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PharmacyConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PharmacyConfig::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .check(Expr::col(PharmacyConfig::Id).eq(1)),
                    )
                    .col(ColumnDef::new(PharmacyConfig::PharmacyName).string().not_null())
                    .col(ColumnDef::new(PharmacyConfig::Address).text().not_null())
                    .col(ColumnDef::new(PharmacyConfig::Phone).string().not_null())
                    .col(ColumnDef::new(PharmacyConfig::Email).string().not_null())
                    .col(ColumnDef::new(PharmacyConfig::LicenseNumber).string().not_null())
                    .col(
                        ColumnDef::new(PharmacyConfig::RegistrationNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PharmacyConfig::OwnerName).string().not_null())
                    .col(ColumnDef::new(PharmacyConfig::WorkingHours).text().not_null())
                    .col(
                        ColumnDef::new(PharmacyConfig::Currency)
                            .string()
                            .not_null()
                            .default("INR"),
                    )
                    .col(
                        ColumnDef::new(PharmacyConfig::TaxRate)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PharmacyConfig::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PharmacyConfig::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PharmacyConfig::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PharmacyConfig {
    Table,
    Id,
    PharmacyName,
    Address,
    Phone,
    Email,
    LicenseNumber,
    RegistrationNumber,
    OwnerName,
    WorkingHours,
    Currency,
    TaxRate,
    CreatedAt,
    UpdatedAt,
}
