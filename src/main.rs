mod commission;
mod config;
mod entity;
mod error;
mod plugins;
mod prelude;
mod pricing;
mod rate_limit;
mod state;
mod sv;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::Config, prelude::*, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "gymbook=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting gymbook v{}", env!("CARGO_PKG_VERSION"));
  info!(
    "Rate limit: {} requests per {}",
    config.rate_limit_max,
    humantime::format_duration(config.rate_limit_window)
  );

  let app = Arc::new(AppState::new(config).await?);

  let started = plugins::App::new()
    .register(plugins::server::Plugin)
    .register(plugins::cron::RateLimitGc)
    .run(app)
    .await?;
  debug!("Plugins running: {}", started.join(", "));

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");

  Ok(())
}
