//! Debounced search scheduling and request ordering.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Default quiet period before a typed search runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Identifies one issued request. Later tokens compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Monotonic source of [`RequestToken`]s. Only the latest token is current.
#[derive(Debug, Default)]
pub struct RequestSequence {
  last: u64,
}

impl RequestSequence {
  pub fn new() -> Self {
    Self::default()
  }

  /// Issue a new token, superseding every earlier one.
  pub fn next(&mut self) -> RequestToken {
    self.last += 1;
    RequestToken(self.last)
  }

  pub fn is_current(&self, token: RequestToken) -> bool {
    token.0 == self.last
  }
}

/// Coalesces bursts of search input into one delayed run.
///
/// Each [`schedule`](Self::schedule) aborts the pending timer, so only the
/// last call in a burst fires. Anything that runs immediately also cancels
/// the timer and supersedes its token.
#[derive(Debug)]
pub struct SearchDebouncer {
  delay: Duration,
  pending: Option<JoinHandle<()>>,
  sequence: RequestSequence,
}

impl SearchDebouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
      sequence: RequestSequence::new(),
    }
  }

  /// Restart the timer. `fire` runs with the new token once `delay` passes
  /// without another call. Must be called inside a tokio runtime.
  pub fn schedule<F>(&mut self, fire: F) -> RequestToken
  where
    F: FnOnce(RequestToken) + Send + 'static,
  {
    self.cancel();
    let token = self.sequence.next();
    let delay = self.delay;
    trace!(?token, ?delay, "Scheduling search");

    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      fire(token);
    }));
    token
  }

  /// Bypass the timer: cancel anything pending and issue a fresh token.
  pub fn immediate(&mut self) -> RequestToken {
    self.cancel();
    self.sequence.next()
  }

  /// Abort the pending timer, if any.
  pub fn cancel(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }

  /// Whether a timer is still waiting to fire.
  pub fn is_pending(&self) -> bool {
    self
      .pending
      .as_ref()
      .is_some_and(|handle| !handle.is_finished())
  }

  /// Whether `token` was the last one issued.
  pub fn is_latest(&self, token: RequestToken) -> bool {
    self.sequence.is_current(token)
  }
}

impl Default for SearchDebouncer {
  fn default() -> Self {
    Self::new(DEFAULT_DEBOUNCE)
  }
}

impl Drop for SearchDebouncer {
  fn drop(&mut self) {
    self.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::sync::mpsc;
  use tokio::time::Instant;

  #[test]
  fn test_sequence_only_latest_is_current() {
    let mut sequence = RequestSequence::new();
    let first = sequence.next();
    let second = sequence.next();
    assert!(second > first);
    assert!(!sequence.is_current(first));
    assert!(sequence.is_current(second));
  }

  #[tokio::test(start_paused = true)]
  async fn test_fires_after_delay() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut debouncer = SearchDebouncer::default();
    let start = Instant::now();

    let token = debouncer.schedule(move |t| {
      let _ = tx.send(t);
    });
    assert!(debouncer.is_pending());

    assert_eq!(rx.recv().await, Some(token));
    assert!(start.elapsed() >= DEFAULT_DEBOUNCE);
    assert!(debouncer.is_latest(token));
  }

  #[tokio::test(start_paused = true)]
  async fn test_burst_fires_only_last() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut debouncer = SearchDebouncer::new(Duration::from_millis(300));

    let mut last = None;
    for _ in 0..5 {
      let tx = tx.clone();
      last = Some(debouncer.schedule(move |t| {
        let _ = tx.send(t);
      }));
      tokio::time::sleep(Duration::from_millis(100)).await;
    }
    drop(tx);

    assert_eq!(rx.recv().await, last);
    // Aborted timers never fire
    assert_eq!(rx.recv().await, None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_immediate_supersedes_pending() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut debouncer = SearchDebouncer::default();

    let typed = debouncer.schedule(move |t| {
      let _ = tx.send(t);
    });
    let submitted = debouncer.immediate();

    assert!(!debouncer.is_pending());
    assert!(!debouncer.is_latest(typed));
    assert!(debouncer.is_latest(submitted));
    assert_eq!(rx.recv().await, None);
  }
}
