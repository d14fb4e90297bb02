pub use sea_orm_migration::prelude::*;

mod m20260105_000001_catalog;
mod m20260105_000002_plugins;
mod m20260112_000001_ratings_suggestions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_catalog::Migration),
            Box::new(m20260105_000002_plugins::Migration),
            Box::new(m20260112_000001_ratings_suggestions::Migration),
        ]
    }
}
