//! Fixed-window rate limiting.
//!
//! Each key gets a counter that resets at a fixed boundary. Bursts of up to
//! twice the limit are possible across a boundary.

mod middleware;
mod store;

use chrono::DateTime as UtcDateTime;
pub use middleware::enforce;
pub use store::{MemoryStore, RateLimitStore, Window};

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
  pub allowed: bool,
  pub limit: u32,
  pub remaining: u32,
  pub reset_at: UtcDateTime<Utc>,
  /// Zero when allowed.
  pub retry_after: Duration,
}

pub struct RateLimiter {
  store: Arc<dyn RateLimitStore>,
  max_requests: u32,
  window: TimeDelta,
}

impl RateLimiter {
  pub fn new(
    store: Arc<dyn RateLimitStore>,
    max_requests: u32,
    window: Duration,
  ) -> Self {
    let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::zero());
    Self { store, max_requests, window }
  }

  pub fn in_memory(max_requests: u32, window: Duration) -> Self {
    Self::new(Arc::new(MemoryStore::new()), max_requests, window)
  }

  pub fn key(identity: &str, path: &str) -> String {
    format!("{identity}:{path}")
  }

  pub async fn check(&self, key: &str) -> Decision {
    self.check_at(key, Utc::now()).await
  }

  pub async fn check_at(&self, key: &str, now: UtcDateTime<Utc>) -> Decision {
    match self.store.increment(key, self.window, now).await {
      Ok(window) => self.decide(window, now),
      Err(err) => {
        // fail open
        warn!("rate limit store unavailable for `{key}`: {err}");
        Decision {
          allowed: true,
          limit: self.max_requests,
          remaining: self.max_requests,
          reset_at: now + self.window,
          retry_after: Duration::ZERO,
        }
      }
    }
  }

  fn decide(&self, window: Window, now: UtcDateTime<Utc>) -> Decision {
    let allowed = window.count <= self.max_requests;
    let retry_after = if allowed {
      Duration::ZERO
    } else {
      let millis = (window.reset_at - now).num_milliseconds().max(0) as u64;
      // round up to whole seconds, at least one
      Duration::from_secs(millis.div_ceil(1000).max(1))
    };

    Decision {
      allowed,
      limit: self.max_requests,
      remaining: self.max_requests.saturating_sub(window.count),
      reset_at: window.reset_at,
      retry_after,
    }
  }

  pub async fn reset(&self, key: &str) -> Result<()> {
    self.store.reset(key).await
  }

  pub async fn purge_expired(&self) -> Result<usize> {
    self.store.purge_expired(Utc::now()).await
  }
}
