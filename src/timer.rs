//! Restartable one-shot timer on the tokio clock.
//!
//! A `Timer` only stores a deadline; nothing runs in the background. The
//! owner either polls it with [`Timer::fire`] or awaits [`Timer::expired`]
//! inside a `select!`. Reading `tokio::time::Instant` means a paused test
//! runtime can drive it with `tokio::time::advance`.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Timer {
  delay: Duration,
  deadline: Option<Instant>,
}

impl Timer {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      deadline: None,
    }
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  /// Arm (or re-arm) the timer. Any previous deadline is replaced.
  pub fn arm(&mut self) {
    self.deadline = Some(Instant::now() + self.delay);
  }

  pub fn cancel(&mut self) {
    self.deadline = None;
  }

  pub fn is_armed(&self) -> bool {
    self.deadline.is_some()
  }

  /// Returns true once when the deadline has passed, disarming the timer.
  pub fn fire(&mut self) -> bool {
    match self.deadline {
      Some(deadline) if Instant::now() >= deadline => {
        self.deadline = None;
        true
      }
      _ => false,
    }
  }

  /// Resolves at the deadline; never resolves while disarmed.
  pub async fn expired(&self) {
    match self.deadline {
      Some(deadline) => tokio::time::sleep_until(deadline).await,
      None => std::future::pending().await,
    }
  }
}
