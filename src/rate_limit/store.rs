use async_trait::async_trait;
use chrono::DateTime as UtcDateTime;

use crate::prelude::*;

/// One fixed window for a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub count: u32,
  pub reset_at: UtcDateTime<Utc>,
}

impl Window {
  fn fresh(now: UtcDateTime<Utc>, length: TimeDelta) -> Self {
    Self { count: 0, reset_at: now + length }
  }

  pub fn is_expired(&self, now: UtcDateTime<Utc>) -> bool {
    now >= self.reset_at
  }
}

/// Counter storage behind [`super::RateLimiter`].
///
/// `increment` must be atomic per key: two concurrent calls for the same key
/// observe distinct counts.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
  /// The live window for `key`, if any.
  async fn get(
    &self,
    key: &str,
    now: UtcDateTime<Utc>,
  ) -> Result<Option<Window>>;

  /// Counts one hit, opening a new window of `length` when none is live.
  async fn increment(
    &self,
    key: &str,
    length: TimeDelta,
    now: UtcDateTime<Utc>,
  ) -> Result<Window>;

  async fn reset(&self, key: &str) -> Result<()>;

  /// Drops expired windows, returning how many were removed.
  async fn purge_expired(&self, now: UtcDateTime<Utc>) -> Result<usize>;
}

/// Process-local store. Only correct for a single instance deployment.
#[derive(Default)]
pub struct MemoryStore {
  windows: DashMap<String, Window>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
  async fn get(
    &self,
    key: &str,
    now: UtcDateTime<Utc>,
  ) -> Result<Option<Window>> {
    Ok(
      self
        .windows
        .get(key)
        .map(|window| *window)
        .filter(|window| !window.is_expired(now)),
    )
  }

  async fn increment(
    &self,
    key: &str,
    length: TimeDelta,
    now: UtcDateTime<Utc>,
  ) -> Result<Window> {
    // the entry guard holds the shard lock for the whole read-modify-write
    let mut window = self
      .windows
      .entry(key.to_string())
      .or_insert_with(|| Window::fresh(now, length));

    if window.is_expired(now) {
      *window = Window::fresh(now, length);
    }
    window.count = window.count.saturating_add(1);

    Ok(*window)
  }

  async fn reset(&self, key: &str) -> Result<()> {
    self.windows.remove(key);
    Ok(())
  }

  async fn purge_expired(&self, now: UtcDateTime<Utc>) -> Result<usize> {
    let before = self.windows.len();
    self.windows.retain(|_, window| !window.is_expired(now));
    Ok(before.saturating_sub(self.windows.len()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_increment_opens_window() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let length = TimeDelta::seconds(60);

    let window = store.increment("k", length, now).await.unwrap();
    assert_eq!(window.count, 1);
    assert_eq!(window.reset_at, now + length);

    let window = store.increment("k", length, now).await.unwrap();
    assert_eq!(window.count, 2);
    assert_eq!(window.reset_at, now + length);
  }

  #[tokio::test]
  async fn test_expired_window_restarts() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let length = TimeDelta::seconds(60);

    store.increment("k", length, now).await.unwrap();
    store.increment("k", length, now).await.unwrap();

    let later = now + length;
    assert_eq!(store.get("k", later).await.unwrap(), None);

    let window = store.increment("k", length, later).await.unwrap();
    assert_eq!(window.count, 1);
    assert_eq!(window.reset_at, later + length);
  }

  #[test]
  fn test_reset_and_purge() {
    tokio_test::block_on(async {
      let store = MemoryStore::new();
      let now = Utc::now();

      store.increment("a", TimeDelta::seconds(10), now).await.unwrap();
      store.increment("b", TimeDelta::seconds(60), now).await.unwrap();
      store.increment("c", TimeDelta::seconds(60), now).await.unwrap();

      store.reset("c").await.unwrap();
      assert_eq!(store.get("c", now).await.unwrap(), None);

      let purged =
        store.purge_expired(now + TimeDelta::seconds(30)).await.unwrap();
      assert_eq!(purged, 1);
      assert!(store.get("b", now).await.unwrap().is_some());
    });
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_increments_are_counted_once() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();

    let handles: Vec<_> = (0..64)
      .map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
          store.increment("k", TimeDelta::seconds(60), now).await.unwrap()
        })
      })
      .collect();

    for handle in handles {
      handle.await.unwrap();
    }

    let window = store.get("k", now).await.unwrap().unwrap();
    assert_eq!(window.count, 64);
  }
}
