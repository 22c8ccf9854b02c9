pub use sea_orm_migration::prelude::*;

mod common;
mod m20240101_000000_bootstrap;
mod m20240101_000001_create_categories;
mod m20240101_000002_create_currencies;
mod m20240101_000003_seed_currencies;
mod m20240101_000004_create_asset_sources;
mod m20240101_000005_create_baskets;
mod m20240101_000006_create_saved_baskets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000000_bootstrap::Migration),
            Box::new(m20240101_000001_create_categories::Migration),
            Box::new(m20240101_000002_create_currencies::Migration),
            Box::new(m20240101_000003_seed_currencies::Migration),
            Box::new(m20240101_000004_create_asset_sources::Migration),
            Box::new(m20240101_000005_create_baskets::Migration),
            Box::new(m20240101_000006_create_saved_baskets::Migration),
        ]
    }
}
