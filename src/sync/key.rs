use std::fmt;

/// Fully-formed resource locator identifying one cache slot.
///
/// Two subscriptions share a cache entry and an in-flight request exactly
/// when their request keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
  pub fn new(locator: impl Into<String>) -> Self {
    Self(locator.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for RequestKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
