use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// A single post as returned by the remote feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub id: u64,
  #[serde(rename = "userId", alias = "ownerId")]
  pub owner_id: u64,
  pub title: String,
  pub body: String,
}

/// Owner (user) ID used to filter the feed. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(NonZeroU64);

impl OwnerId {
  /// Returns `None` for zero.
  pub fn new(id: u64) -> Option<Self> {
    NonZeroU64::new(id).map(Self)
  }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}
