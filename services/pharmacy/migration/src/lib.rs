use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_patients;
mod m20260301_000003_create_doctors;
mod m20260301_000004_create_staff;
mod m20260301_000005_create_partners;
mod m20260301_000006_create_pharmacy_config;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_patients::Migration),
            Box::new(m20260301_000003_create_doctors::Migration),
            Box::new(m20260301_000004_create_staff::Migration),
            Box::new(m20260301_000005_create_partners::Migration),
            Box::new(m20260301_000006_create_pharmacy_config::Migration),
        ]
    }
}
