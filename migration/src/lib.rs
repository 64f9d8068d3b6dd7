//! Database migrations using SeaORM

pub use sea_orm_migration::prelude::*;

mod m20261018_000001_create_keys;
mod m20261018_000002_create_identities;
mod m20261018_000003_create_bans;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20261018_000001_create_keys::Migration),
      Box::new(m20261018_000002_create_identities::Migration),
      Box::new(m20261018_000003_create_bans::Migration),
    ]
  }
}
