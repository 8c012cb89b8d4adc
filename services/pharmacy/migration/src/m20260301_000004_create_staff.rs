use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Staff::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Staff::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Staff::EmployeeId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Staff::Department).string().not_null())
                    .col(ColumnDef::new(Staff::Salary).double().not_null())
                    .col(ColumnDef::new(Staff::HireDate).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Staff::Table, Staff::Id)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Staff::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Staff {
    Table,
    Id,
    EmployeeId,
    Department,
    Salary,
    HireDate,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
