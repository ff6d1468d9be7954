//! Wall-clock abstraction and the window function.
//!
//! Tokens are bound to a discrete *window*: `floor(now_ms / WINDOW_PERIOD_MS)`.
//! The current instant is always read through a [`Clock`] so that window
//! boundaries can be pinned in tests.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone as _, Utc};

/// Length of one token window in milliseconds.
pub const WINDOW_PERIOD_MS: i64 = 15_000;

/// Map an instant to its window index.
///
/// Uses floor division so the function stays monotonic across the epoch.
pub fn window(now: DateTime<Utc>) -> i64 {
  window_at_millis(now.timestamp_millis())
}

pub fn window_at_millis(now_ms: i64) -> i64 { now_ms.div_euclid(WINDOW_PERIOD_MS) }

/// A source of the current time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  fn current_window(&self) -> i64 { window(self.now()) }
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
  millis: AtomicI64,
}

impl ManualClock {
  pub fn at_millis(millis: i64) -> Self {
    Self { millis: AtomicI64::new(millis) }
  }

  pub fn set_millis(&self, millis: i64) { self.millis.store(millis, Ordering::SeqCst); }

  pub fn advance_millis(&self, delta: i64) {
    self.millis.fetch_add(delta, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    let millis = self.millis.load(Ordering::SeqCst);
    Utc
      .timestamp_millis_opt(millis)
      .single()
      .unwrap_or(DateTime::<Utc>::MIN_UTC)
  }
}
