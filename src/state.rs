use crate::{config::Config, prelude::*, rate_limit::RateLimiter, sv};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub limiter: RateLimiter,
}

impl AppState {
  pub async fn new(config: Config) -> Result<Self> {
    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;
    info!("Database ready at {}", config.database_url);

    Ok(Self::with_db(db, config))
  }

  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    let limiter =
      RateLimiter::in_memory(config.rate_limit_max, config.rate_limit_window);
    Self { db, config, limiter }
  }
}

/// Short-lived service handles borrowing the shared connection.
pub trait Services {
  fn promotions(&self) -> sv::Promotion<'_>;
  fn affiliates(&self) -> sv::Affiliate<'_>;
}

impl Services for AppState {
  fn promotions(&self) -> sv::Promotion<'_> {
    sv::Promotion::new(&self.db)
  }

  fn affiliates(&self) -> sv::Affiliate<'_> {
    sv::Affiliate::new(&self.db, &self.config.commission_rates)
  }
}
