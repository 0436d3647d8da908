use thiserror::Error;

/// Why a fetch of the remote feed failed.
///
/// Cloneable so a single outcome can be handed to every subscriber of a key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
  /// Transport or connectivity failure
  #[error("network error: {0}")]
  Network(String),

  /// Server answered with a non-success status
  #[error("request failed with status {status}")]
  HttpStatus { status: u16 },

  /// Body was not a JSON array of posts
  #[error("malformed response: {0}")]
  Parse(String),

  /// Subscription ended before an outcome was available
  #[error("subscription was cancelled")]
  Cancelled,
}

impl FetchError {
  pub fn is_network(&self) -> bool {
    matches!(self, FetchError::Network(_))
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    match err.status() {
      Some(status) => FetchError::HttpStatus {
        status: status.as_u16(),
      },
      None if err.is_decode() => FetchError::Parse(err.to_string()),
      None => FetchError::Network(err.to_string()),
    }
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(err: serde_json::Error) -> Self {
    FetchError::Parse(err.to_string())
  }
}
