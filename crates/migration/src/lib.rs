//! Migrator for the emoji service schema.
pub use sea_orm_migration::prelude::*;

mod m20250407_000001_create_icon;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250407_000001_create_icon::Migration)]
    }
}
