//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use std::{sync::Arc, time::Duration};

  use sea_orm::{Database, DatabaseConnection};

  use crate::{
    commission::CommissionTable,
    config::Config,
    prelude::{Migrator, MigratorTrait},
    state::AppState,
  };

  pub const ADMIN_TOKEN: &str = "test-admin-token";

  /// Creates an in-memory SQLite database with the full schema
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
  }

  pub fn config(rate_limit_max: u32) -> Config {
    Config {
      database_url: "sqlite::memory:".into(),
      port: 0,
      admin_token: ADMIN_TOKEN.into(),
      rate_limit_max,
      rate_limit_window: Duration::from_secs(60),
      rate_limit_gc_interval: Duration::from_secs(60),
      commission_rates: CommissionTable::default(),
    }
  }

  pub async fn app(rate_limit_max: u32) -> Arc<AppState> {
    Arc::new(AppState::with_db(setup().await, config(rate_limit_max)))
  }
}
