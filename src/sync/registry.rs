//! Registry of outstanding requests, at most one per key.

use std::collections::HashMap;
use tokio::task::JoinHandle;

use super::key::RequestKey;

/// Whether a request loads missing data or refreshes cached data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
  Load,
  Revalidate,
}

/// One outstanding request. `task` is either the fetch itself or the
/// delay before the next retry.
#[derive(Debug)]
pub struct InFlight {
  pub generation: u64,
  pub attempt: u32,
  pub kind: FetchKind,
  task: JoinHandle<()>,
}

#[derive(Debug, Default)]
pub struct InFlightRegistry {
  requests: HashMap<RequestKey, InFlight>,
  next_generation: u64,
}

impl InFlightRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(&self, key: &RequestKey) -> bool {
    self.requests.contains_key(key)
  }

  pub fn get(&self, key: &RequestKey) -> Option<&InFlight> {
    self.requests.get(key)
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.requests.len()
  }

  /// Whether a completion for `generation` is still the current one.
  pub fn is_current(&self, key: &RequestKey, generation: u64) -> bool {
    self
      .requests
      .get(key)
      .is_some_and(|request| request.generation == generation)
  }

  /// Reserve a new generation number for a request about to start.
  pub fn next_generation(&mut self) -> u64 {
    self.next_generation += 1;
    self.next_generation
  }

  /// Register a request. A request already registered for the key is
  /// superseded and its task aborted.
  pub fn insert(
    &mut self,
    key: RequestKey,
    generation: u64,
    kind: FetchKind,
    task: JoinHandle<()>,
  ) {
    let request = InFlight {
      generation,
      attempt: 1,
      kind,
      task,
    };
    if let Some(previous) = self.requests.insert(key, request) {
      previous.task.abort();
    }
  }

  /// Swap the task driving a request (fetch ↔ retry delay).
  pub fn replace_task(&mut self, key: &RequestKey, attempt: u32, task: JoinHandle<()>) {
    match self.requests.get_mut(key) {
      Some(request) => {
        request.attempt = attempt;
        // the old task has already finished; this only drops its handle
        request.task = task;
      }
      None => task.abort(),
    }
  }

  /// Remove a request, aborting its task if it is still running.
  pub fn remove(&mut self, key: &RequestKey) -> Option<InFlight> {
    let request = self.requests.remove(key)?;
    request.task.abort();
    Some(request)
  }

  pub fn abort_all(&mut self) {
    for (_, request) in self.requests.drain() {
      request.task.abort();
    }
  }
}
