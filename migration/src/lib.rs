pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_promotions;
mod m20261001_000002_create_affiliates;
mod m20261001_000003_create_affiliate_conversions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20261001_000001_create_promotions::Migration),
      Box::new(m20261001_000002_create_affiliates::Migration),
      Box::new(m20261001_000003_create_affiliate_conversions::Migration),
    ]
  }
}
