//! Process-wide cache of per-key fetch state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::time::Instant;

use super::key::RequestKey;
use super::state::SyncState;

/// A cached entry: the published state plus bookkeeping the subscribers
/// don't see.
struct CacheEntry<T> {
  state: watch::Sender<SyncState<T>>,
  /// When the last request for this key was issued
  started_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
  fn new() -> Self {
    let (state, _) = watch::channel(SyncState::default());
    Self {
      state,
      started_at: None,
    }
  }

  fn subscribers(&self) -> usize {
    self.state.receiver_count()
  }
}

/// Shared handle to the cache.
///
/// Constructed once and handed to the coordinator; clones share the same
/// entries. Each entry is a watch channel, so the number of live
/// subscriptions doubles as the entry's reference count.
pub struct CacheStore<T> {
  entries: Arc<Mutex<HashMap<RequestKey, CacheEntry<T>>>>,
}

impl<T> CacheStore<T> {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<RequestKey, CacheEntry<T>>> {
    // State is replaced wholesale on every write, so a poisoned map is
    // still consistent.
    self
      .entries
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Register a subscriber, creating the entry if needed.
  pub fn subscribe(&self, key: &RequestKey) -> watch::Receiver<SyncState<T>> {
    self
      .lock()
      .entry(key.clone())
      .or_insert_with(CacheEntry::new)
      .state
      .subscribe()
  }

  #[cfg(test)]
  pub fn contains(&self, key: &RequestKey) -> bool {
    self.lock().contains_key(key)
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  /// Drop every entry. Outstanding subscriptions see their channel close.
  #[cfg(test)]
  pub fn clear(&self) {
    self.lock().clear();
  }

  pub fn subscribers(&self, key: &RequestKey) -> usize {
    self.lock().get(key).map_or(0, CacheEntry::subscribers)
  }

  pub(crate) fn started_at(&self, key: &RequestKey) -> Option<Instant> {
    self.lock().get(key).and_then(|entry| entry.started_at)
  }

  /// Keys that currently have at least one subscriber.
  pub(crate) fn subscribed_keys(&self) -> Vec<RequestKey> {
    self
      .lock()
      .iter()
      .filter(|(_, entry)| entry.subscribers() > 0)
      .map(|(key, _)| key.clone())
      .collect()
  }

  /// Record a request start and apply `f` to the published state.
  pub(crate) fn start(&self, key: &RequestKey, f: impl FnOnce(&mut SyncState<T>)) {
    let mut entries = self.lock();
    let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
    entry.started_at = Some(Instant::now());
    entry.state.send_modify(f);
  }

  /// Apply `f` to the published state, creating the entry if it was
  /// evicted meanwhile.
  pub(crate) fn update(&self, key: &RequestKey, f: impl FnOnce(&mut SyncState<T>)) {
    self
      .lock()
      .entry(key.clone())
      .or_insert_with(CacheEntry::new)
      .state
      .send_modify(f);
  }

  /// Evict entries `keep` rejects. `keep` receives the key, its subscriber
  /// count and its last request start.
  pub(crate) fn retain(&self, mut keep: impl FnMut(&RequestKey, usize, Option<Instant>) -> bool) {
    self
      .lock()
      .retain(|key, entry| keep(key, entry.subscribers(), entry.started_at));
  }
}

impl<T: Clone> CacheStore<T> {
  /// Current state of a key without subscribing.
  pub fn get(&self, key: &RequestKey) -> Option<SyncState<T>> {
    self.lock().get(key).map(|entry| entry.state.borrow().clone())
  }
}

impl<T> Clone for CacheStore<T> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
    }
  }
}

impl<T> Default for CacheStore<T> {
  fn default() -> Self {
    Self::new()
  }
}
