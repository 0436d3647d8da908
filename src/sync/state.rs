//! Per-key fetch state published to subscribers.

use std::sync::Arc;

use crate::api::FetchError;

/// Lifecycle of a single request key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
  /// Entry exists but nothing has been requested yet
  #[default]
  Idle,
  /// First fetch (or retry) in progress, no data yet
  Loading,
  /// Background refetch while cached data is shown
  Validating,
  /// Last outcome was data
  Success,
  /// Retries exhausted
  Error,
}

impl FetchPhase {
  pub fn is_loading(self) -> bool {
    matches!(self, FetchPhase::Loading)
  }

  /// True while any request for the key is outstanding.
  pub fn is_validating(self) -> bool {
    matches!(self, FetchPhase::Loading | FetchPhase::Validating)
  }

  pub fn is_settled(self) -> bool {
    matches!(self, FetchPhase::Success | FetchPhase::Error)
  }
}

/// Snapshot of one cache entry
#[derive(Debug, Clone)]
pub struct SyncState<T> {
  pub phase: FetchPhase,
  /// Last successful result, retained across failures
  pub data: Option<Arc<T>>,
  /// Error surfaced after retries were exhausted
  pub error: Option<FetchError>,
  /// Failure of the last background revalidation; diagnostics only
  pub validation_error: Option<FetchError>,
}

impl<T> Default for SyncState<T> {
  fn default() -> Self {
    Self {
      phase: FetchPhase::Idle,
      data: None,
      error: None,
      validation_error: None,
    }
  }
}

impl<T> SyncState<T> {
  /// An entry that was just subscribed and has nothing cached is about to
  /// load; the coordinator has not picked it up yet.
  fn is_pending(&self) -> bool {
    self.phase == FetchPhase::Idle && self.data.is_none() && self.error.is_none()
  }

  /// No data yet and a load is under way or about to start.
  pub fn is_loading(&self) -> bool {
    self.phase.is_loading() || self.is_pending()
  }

  pub fn is_validating(&self) -> bool {
    self.phase.is_validating() || self.is_pending()
  }

  #[cfg(test)]
  pub fn is_error(&self) -> bool {
    self.error.is_some()
  }

  /// The settled outcome, or `None` while idle or fetching.
  pub fn outcome(&self) -> Option<Result<Arc<T>, FetchError>> {
    match self.phase {
      FetchPhase::Success => Some(self.data.clone().ok_or(FetchError::Cancelled)),
      FetchPhase::Error => Some(Err(self.error.clone().unwrap_or(FetchError::Cancelled))),
      _ => None,
    }
  }

  pub(crate) fn begin(&mut self) {
    self.phase = if self.data.is_some() {
      FetchPhase::Validating
    } else {
      FetchPhase::Loading
    };
  }

  pub(crate) fn succeed(&mut self, data: T) {
    self.phase = FetchPhase::Success;
    self.data = Some(Arc::new(data));
    self.error = None;
    self.validation_error = None;
  }

  pub(crate) fn fail_validation(&mut self, err: FetchError) {
    self.phase = FetchPhase::Success;
    self.validation_error = Some(err);
  }

  pub(crate) fn fail(&mut self, err: FetchError) {
    self.phase = FetchPhase::Error;
    self.error = Some(err);
  }
}
