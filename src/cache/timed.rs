//! Single-slot cache with a fixed time-to-live.

use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for statistics and dropdown data.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct Entry<T> {
  value: T,
  stored_at: Instant,
}

/// Holds at most one value, which expires `ttl` after it was stored.
///
/// Staleness is checked lazily on read; there is no background eviction. An
/// expired value is never handed out.
#[derive(Debug, Clone)]
pub struct TimedCache<T> {
  entry: Option<Entry<T>>,
  ttl: Duration,
}

impl<T> TimedCache<T> {
  pub fn new(ttl: Duration) -> Self {
    Self { entry: None, ttl }
  }

  /// The stored value if it is younger than the TTL.
  pub fn get(&self) -> Option<&T> {
    self.fresh_entry().map(|entry| &entry.value)
  }

  /// Age of the stored value if it is still fresh.
  pub fn age(&self) -> Option<Duration> {
    self.fresh_entry().map(|entry| entry.stored_at.elapsed())
  }

  /// Store `value`, replacing any previous one and stamping the current time.
  pub fn set(&mut self, value: T) {
    self.entry = Some(Entry {
      value,
      stored_at: Instant::now(),
    });
  }

  /// Drop the stored value. Returns whether there was one.
  pub fn invalidate(&mut self) -> bool {
    self.entry.take().is_some()
  }

  fn fresh_entry(&self) -> Option<&Entry<T>> {
    self
      .entry
      .as_ref()
      .filter(|entry| entry.stored_at.elapsed() < self.ttl)
  }
}

impl<T> Default for TimedCache<T> {
  fn default() -> Self {
    Self::new(DEFAULT_TTL)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_get_after_set_returns_value() {
    let mut cache = TimedCache::default();
    assert_eq!(cache.get(), None);

    cache.set(7);
    assert_eq!(cache.get(), Some(&7));

    cache.set(8);
    assert_eq!(cache.get(), Some(&8));
  }

  #[tokio::test(start_paused = true)]
  async fn test_value_expires_at_ttl() {
    let mut cache = TimedCache::new(Duration::from_secs(300));
    cache.set("stats");

    tokio::time::advance(Duration::from_secs(299)).await;
    assert_eq!(cache.get(), Some(&"stats"));
    assert!(cache.age().is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get(), None);
    assert_eq!(cache.age(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_always_clears() {
    let mut cache = TimedCache::default();
    cache.set(1);
    assert!(cache.invalidate());
    assert_eq!(cache.get(), None);
    assert!(!cache.invalidate());
  }

  #[tokio::test(start_paused = true)]
  async fn test_zero_ttl_is_never_fresh() {
    let mut cache = TimedCache::new(Duration::ZERO);
    cache.set(1);
    assert_eq!(cache.get(), None);
  }
}
