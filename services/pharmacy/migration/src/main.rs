use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(rxdesk_pharmacy_migration::Migrator).await;
}
