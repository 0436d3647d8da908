//! The posts feed: one active owner filter over the shared coordinator.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::{Endpoint, FetchError, OwnerId, Post};
use crate::sync::{SyncHandle, Subscription};

/// Read-only view of the active query, as rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
  pub owner: Option<OwnerId>,
  pub posts: Option<Arc<Vec<Post>>>,
  pub is_loading: bool,
  pub error: Option<FetchError>,
  pub is_validating: bool,
  pub validation_error: Option<FetchError>,
}

impl FeedSnapshot {
  pub fn post_count(&self) -> usize {
    self.posts.as_ref().map_or(0, |posts| posts.len())
  }
}

struct ActiveQuery {
  owner: Option<OwnerId>,
  subscription: Subscription<Vec<Post>>,
}

#[derive(Clone)]
pub struct PostsFeed {
  sync: SyncHandle<Vec<Post>>,
  endpoint: Arc<Endpoint>,
  active: Arc<Mutex<ActiveQuery>>,
}

impl PostsFeed {
  /// Subscribe to `owner` straight away.
  pub fn new(sync: SyncHandle<Vec<Post>>, endpoint: Endpoint, owner: Option<OwnerId>) -> Self {
    let subscription = sync.subscribe(endpoint.request_key(owner));
    Self {
      sync,
      endpoint: Arc::new(endpoint),
      active: Arc::new(Mutex::new(ActiveQuery {
        owner,
        subscription,
      })),
    }
  }

  fn lock(&self) -> MutexGuard<'_, ActiveQuery> {
    self
      .active
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  pub fn endpoint(&self) -> &Endpoint {
    &self.endpoint
  }

  /// Switch the active owner. The previous subscription is released; its
  /// request, if any, still completes into the cache.
  pub fn set_owner(&self, owner: Option<OwnerId>) {
    let mut active = self.lock();
    if active.owner == owner {
      return;
    }
    let key = self.endpoint.request_key(owner);
    tracing::info!(%key, "switching active query");
    active.subscription = self.sync.subscribe(key);
    active.owner = owner;
  }

  pub fn snapshot(&self) -> FeedSnapshot {
    let active = self.lock();
    let state = active.subscription.state();
    FeedSnapshot {
      owner: active.owner,
      posts: state.data.clone(),
      is_loading: state.is_loading(),
      error: state.error.clone(),
      is_validating: state.is_validating(),
      validation_error: state.validation_error.clone(),
    }
  }

  pub fn revalidate(&self) {
    let key = self.lock().subscription.key().clone();
    self.sync.revalidate(&key);
  }

  pub fn refetch(&self) {
    let key = self.lock().subscription.key().clone();
    self.sync.refetch(&key);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filter::KeyController;
  use crate::sync::{CacheStore, RequestKey, SyncConfig};
  use crate::ui::views::posts::{body_content, BodyContent};
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  const BASE: &str = "http://feed.test/posts";

  /// Serves one post per request, owned by the requested user, after a
  /// per-key delay. Also returns the number of requests issued.
  fn spawn_feed(delays: &[(Option<u64>, u64)]) -> (PostsFeed, Endpoint, Arc<AtomicUsize>) {
    let endpoint = Endpoint::new(BASE, "userId").unwrap();
    let delays: HashMap<RequestKey, u64> = delays
      .iter()
      .map(|(owner, ms)| (endpoint.request_key(owner.and_then(OwnerId::new)), *ms))
      .collect();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let sync = SyncHandle::spawn(CacheStore::new(), SyncConfig::default(), move |key| {
      counter.fetch_add(1, Ordering::SeqCst);
      let delay = delays.get(&key).copied().unwrap_or(10);
      async move {
        tokio::time::sleep(Duration::from_millis(delay)).await;
        let owner_id = key
          .as_str()
          .rsplit('=')
          .next()
          .and_then(|id| id.parse().ok())
          .unwrap_or(0);
        Ok(vec![Post {
          id: owner_id * 10,
          owner_id,
          title: format!("post by {}", owner_id),
          body: String::new(),
        }])
      }
    });
    (PostsFeed::new(sync, endpoint.clone(), None), endpoint, calls)
  }

  async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_initial_snapshot_is_loading() {
    let (feed, _, _) = spawn_feed(&[]);
    sleep_ms(1).await;

    let snapshot = feed.snapshot();
    assert!(snapshot.is_loading);
    assert!(snapshot.is_validating);
    assert_eq!(snapshot.owner, None);
    assert_eq!(snapshot.post_count(), 0);

    sleep_ms(20).await;
    let snapshot = feed.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.post_count(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_new_owner_reads_as_loading_before_coordinator_runs() {
    let (feed, _, _) = spawn_feed(&[]);
    let snapshot = feed.snapshot();
    assert!(snapshot.is_loading);
    assert_eq!(
      body_content(&snapshot),
      BodyContent::Status {
        loading: true,
        error: false
      }
    );

    feed.set_owner(OwnerId::new(2));
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.owner, OwnerId::new(2));
    assert!(snapshot.is_loading);
    assert!(snapshot.is_validating);
    assert_eq!(
      body_content(&snapshot),
      BodyContent::Status {
        loading: true,
        error: false
      }
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_filter_edits_drive_feed() {
    let (feed, _, calls) = spawn_feed(&[]);
    let on_change = feed.clone();
    let mut controller =
      KeyController::new(Duration::from_millis(500), move |owner| on_change.set_owner(owner));

    sleep_ms(50).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.owner, None);
    assert_eq!(snapshot.posts.as_ref().unwrap()[0].owner_id, 0);

    controller.input("2");
    sleep_ms(499).await;
    assert!(!controller.poll());
    assert_eq!(feed.snapshot().owner, None);
    sleep_ms(1).await;
    assert!(controller.poll());
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.owner, OwnerId::new(2));
    assert!(snapshot.is_loading);

    sleep_ms(50).await;
    let snapshot = feed.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.posts.as_ref().unwrap()[0].owner_id, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // clearing commits at once and the unfiltered list is still cached
    controller.clear();
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.owner, None);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.posts.as_ref().unwrap()[0].owner_id, 0);
    assert_eq!(body_content(&snapshot), BodyContent::Posts);

    sleep_ms(100).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_superseded_key_never_reaches_snapshot() {
    let (feed, _, _) = spawn_feed(&[(Some(1), 2_000), (Some(2), 100)]);
    feed.set_owner(OwnerId::new(1));
    sleep_ms(10).await;
    feed.set_owner(OwnerId::new(2));

    sleep_ms(200).await;
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.owner, OwnerId::new(2));
    assert_eq!(snapshot.posts.as_ref().unwrap()[0].owner_id, 2);

    // the slow response for owner 1 lands in the cache only
    sleep_ms(3_000).await;
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.posts.as_ref().unwrap()[0].owner_id, 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_switching_back_within_window_serves_cache() {
    let (feed, endpoint, _) = spawn_feed(&[(Some(1), 100), (Some(2), 100)]);
    feed.set_owner(OwnerId::new(1));
    sleep_ms(200).await;
    feed.set_owner(OwnerId::new(2));
    sleep_ms(200).await;

    feed.set_owner(OwnerId::new(1));
    let snapshot = feed.snapshot();
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_validating);
    assert_eq!(snapshot.posts.as_ref().unwrap()[0].owner_id, 1);
    assert_eq!(feed.endpoint().base(), endpoint.base());
  }

  #[tokio::test(start_paused = true)]
  async fn test_same_owner_keeps_subscription() {
    let (feed, _, _) = spawn_feed(&[]);
    feed.set_owner(OwnerId::new(3));
    sleep_ms(50).await;
    feed.set_owner(OwnerId::new(3));
    assert!(!feed.snapshot().is_loading);
  }

  #[tokio::test(start_paused = true)]
  async fn test_revalidate_marks_validating() {
    let (feed, _, _) = spawn_feed(&[(None, 100)]);
    sleep_ms(200).await;

    feed.revalidate();
    sleep_ms(1).await;
    let snapshot = feed.snapshot();
    assert!(snapshot.is_validating);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.post_count(), 1);

    sleep_ms(200).await;
    assert!(!feed.snapshot().is_validating);
  }
}
