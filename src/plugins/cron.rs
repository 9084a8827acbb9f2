use std::sync::Arc;

use async_trait::async_trait;

use crate::{plugins::Plugin, prelude::*, state::AppState};

/// Drops expired rate limit windows so idle clients do not pile up.
pub struct RateLimitGc;

#[async_trait]
impl Plugin for RateLimitGc {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let period = app.config.rate_limit_gc_interval;
    info!(
      "Rate limit GC started (every {})",
      humantime::format_duration(period)
    );

    tokio::spawn(async move {
      let mut interval = tokio::time::interval(period);
      // the first tick completes immediately
      interval.tick().await;

      loop {
        interval.tick().await;
        match app.limiter.purge_expired().await {
          Ok(0) => {}
          Ok(purged) => debug!("Purged {purged} expired rate limit windows"),
          Err(err) => error!("Rate limit GC failed: {err}"),
        }
      }
    });

    Ok(())
  }
}
