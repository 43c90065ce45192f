pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_portfolios_and_strategies;
mod m20250301_000003_create_trades;
mod m20250301_000004_create_notes;
mod m20250301_000005_create_social;
mod m20250301_000006_create_habits_watchlist_chat;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_portfolios_and_strategies::Migration),
            Box::new(m20250301_000003_create_trades::Migration),
            Box::new(m20250301_000004_create_notes::Migration),
            Box::new(m20250301_000005_create_social::Migration),
            Box::new(m20250301_000006_create_habits_watchlist_chat::Migration),
        ]
    }
}
