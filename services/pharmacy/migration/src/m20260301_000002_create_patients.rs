use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Patients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Patients::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Patients::DateOfBirth).date())
                    .col(ColumnDef::new(Patients::Address).text())
                    .col(ColumnDef::new(Patients::EmergencyContact).string())
                    .col(ColumnDef::new(Patients::MedicalHistory).text())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Patients::Table, Patients::Id)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Patients::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Patients {
    Table,
    Id,
    DateOfBirth,
    Address,
    EmergencyContact,
    MedicalHistory,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
