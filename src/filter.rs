//! Debounced owner filter.
//!
//! Raw text from the filter input is committed only after the input has
//! been quiet for the debounce delay. The committed text is then resolved
//! to an owner key; text that does not resolve leaves the active key as it
//! was.

use std::time::Duration;
use tracing::debug;

use crate::api::OwnerId;
use crate::timer::Timer;

/// Callback invoked on every resolved-key transition
pub type KeyCallback = Box<dyn FnMut(Option<OwnerId>) + Send>;

/// Outcome of resolving committed filter text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedFilter {
  /// Empty text, meaning no filter
  Empty,
  /// A positive owner ID
  Owner(OwnerId),
  /// Non-numeric, non-positive or out of range; ignored
  Invalid,
}

/// Resolve filter text the way a browser's `parseInt` reads a number:
/// leading whitespace and an optional sign, then the longest run of
/// decimal digits.
pub fn parse_filter(text: &str) -> ParsedFilter {
  if text.is_empty() {
    return ParsedFilter::Empty;
  }

  let trimmed = text.trim_start();
  let (negative, rest) = match trimmed.as_bytes().first() {
    Some(b'-') => (true, &trimmed[1..]),
    Some(b'+') => (false, &trimmed[1..]),
    _ => (false, trimmed),
  };

  let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
  if digits_len == 0 || negative {
    return ParsedFilter::Invalid;
  }

  rest[..digits_len]
    .parse::<u64>()
    .ok()
    .and_then(OwnerId::new)
    .map_or(ParsedFilter::Invalid, ParsedFilter::Owner)
}

/// Debounces raw filter text into an active owner key.
pub struct KeyController {
  raw: String,
  active: Option<OwnerId>,
  timer: Timer,
  on_change: KeyCallback,
}

impl KeyController {
  pub fn new<F>(delay: Duration, on_change: F) -> Self
  where
    F: FnMut(Option<OwnerId>) + Send + 'static,
  {
    Self {
      raw: String::new(),
      active: None,
      timer: Timer::new(delay),
      on_change: Box::new(on_change),
    }
  }

  /// Start from an already-active key without invoking the callback.
  pub fn with_initial(mut self, owner: Option<OwnerId>) -> Self {
    self.active = owner;
    self.raw = owner.map(|o| o.to_string()).unwrap_or_default();
    self
  }

  /// Current raw (uncommitted) text
  #[cfg(test)]
  pub fn raw(&self) -> &str {
    &self.raw
  }

  #[cfg(test)]
  pub fn active(&self) -> Option<OwnerId> {
    self.active
  }

  pub fn is_pending(&self) -> bool {
    self.timer.is_armed()
  }

  /// Record new raw text and restart the quiet period.
  pub fn input(&mut self, raw: impl Into<String>) {
    self.raw = raw.into();
    self.timer.arm();
  }

  /// Empty the input and commit "no filter" without waiting.
  pub fn clear(&mut self) {
    self.raw.clear();
    self.timer.cancel();
    self.commit();
  }

  /// Commit if the quiet period has elapsed. Returns true when a commit
  /// happened (whether or not the key changed).
  pub fn poll(&mut self) -> bool {
    if self.timer.fire() {
      self.commit();
      true
    } else {
      false
    }
  }

  /// Resolves when the pending quiet period ends.
  pub async fn debounce_elapsed(&self) {
    self.timer.expired().await
  }

  fn commit(&mut self) {
    let next = match parse_filter(&self.raw) {
      ParsedFilter::Empty => None,
      ParsedFilter::Owner(owner) => Some(owner),
      ParsedFilter::Invalid => {
        debug!(raw = %self.raw, "ignoring invalid owner filter");
        return;
      }
    };

    if next != self.active {
      debug!(from = ?self.active, to = ?next, "owner filter changed");
      self.active = next;
      (self.on_change)(next);
    }
  }
}

impl std::fmt::Debug for KeyController {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("KeyController")
      .field("raw", &self.raw)
      .field("active", &self.active)
      .field("timer", &self.timer)
      .finish_non_exhaustive()
  }
}
