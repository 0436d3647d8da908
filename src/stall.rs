//! Slow-connection detection.
//!
//! Arms a grace-period timer while the active query is loading without an
//! error and reports `slow` once that period passes.

use std::time::Duration;
use tracing::debug;

use crate::timer::Timer;

#[derive(Debug, Clone)]
pub struct StallTimer {
  timer: Timer,
  /// Last observed (loading, error) pair
  last: Option<(bool, bool)>,
  slow: bool,
}

impl StallTimer {
  pub fn new(delay: Duration) -> Self {
    Self {
      timer: Timer::new(delay),
      last: None,
      slow: false,
    }
  }

  pub fn is_slow(&self) -> bool {
    self.slow
  }

  pub fn is_armed(&self) -> bool {
    self.timer.is_armed()
  }

  /// Feed the current loading/error signals. Only a change of either
  /// signal has an effect.
  pub fn observe(&mut self, is_loading: bool, is_error: bool) {
    let signals = (is_loading, is_error);
    if self.last == Some(signals) {
      return;
    }
    self.last = Some(signals);

    self.timer.cancel();
    if is_loading && !is_error {
      self.timer.arm();
    } else {
      self.slow = false;
    }
  }

  /// Raise `slow` if the grace period has elapsed. Returns true when the
  /// signal was raised by this call.
  pub fn poll(&mut self) -> bool {
    if self.timer.fire() {
      debug!(delay = ?self.timer.delay(), "request is taking longer than expected");
      self.slow = true;
      true
    } else {
      false
    }
  }

  /// Hide the signal without touching the timer or the observed signals.
  pub fn dismiss(&mut self) {
    self.slow = false;
  }

  pub async fn elapsed(&self) {
    self.timer.expired().await
  }
}
