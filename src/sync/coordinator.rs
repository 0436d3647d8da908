//! The coordinator task and its handle.
//!
//! A single tokio task owns the in-flight registry and is the only writer
//! of the cache. Handles talk to it over a command channel; fetches and
//! retry delays run as spawned tasks that report back on a completion
//! channel. Every decision for a key therefore happens in one place, one
//! message at a time.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::key::RequestKey;
use super::registry::{FetchKind, InFlightRegistry};
use super::state::{FetchPhase, SyncState};
use super::storage::CacheStore;
use crate::api::FetchError;

/// A boxed future resolving to one fetch outcome
pub type FetchFuture<T> = BoxFuture<'static, Result<T, FetchError>>;

/// Factory producing a fetch for a request key
type FetcherFn<T> = Arc<dyn Fn(RequestKey) -> FetchFuture<T> + Send + Sync>;

/// Tunables for deduplication, retries and revalidation
#[derive(Debug, Clone)]
pub struct SyncConfig {
  /// Subscriptions within this span of the last request start are served
  /// from cache
  pub dedup_interval: Duration,
  /// Total attempts for a load, including the first
  pub max_attempts: u32,
  /// Fixed delay between attempts
  pub retry_interval: Duration,
  pub revalidate_on_focus: bool,
  pub revalidate_on_reconnect: bool,
  /// Refetch cached data on subscribe once the dedup window has passed
  pub revalidate_if_stale: bool,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      dedup_interval: Duration::from_secs(10),
      max_attempts: 3,
      retry_interval: Duration::from_secs(5),
      revalidate_on_focus: true,
      revalidate_on_reconnect: true,
      revalidate_if_stale: true,
    }
  }
}

/// What caused a request to be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
  /// First subscription, or a subscription after the dedup window
  Mount,
  Focus,
  Reconnect,
  Manual,
  /// Forced refetch superseding any in-flight request
  Refetch,
  Retry,
}

/// Notifications sent to listeners registered with [`SyncHandle::listen`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
  FetchStarted {
    key: RequestKey,
    attempt: u32,
    trigger: Trigger,
  },
  RetryScheduled {
    key: RequestKey,
    attempt: u32,
    delay: Duration,
  },
  Updated {
    key: RequestKey,
    phase: FetchPhase,
  },
}

enum Command {
  Activate(RequestKey),
  Revalidate(RequestKey),
  Refetch(RequestKey),
  FocusGained,
  Connectivity(bool),
  Listen(mpsc::UnboundedSender<SyncEvent>),
}

enum Completion<T> {
  Fetched {
    key: RequestKey,
    generation: u64,
    result: Result<T, FetchError>,
  },
  RetryDue {
    key: RequestKey,
    generation: u64,
  },
}

/// A live interest in one request key.
///
/// Dropping the subscription releases it; the entry stays cached until
/// the dedup window has passed.
#[derive(Debug)]
pub struct Subscription<T> {
  key: RequestKey,
  rx: watch::Receiver<SyncState<T>>,
}

impl<T: Clone> Subscription<T> {
  pub fn key(&self) -> &RequestKey {
    &self.key
  }

  /// Current state, available immediately after subscribing
  pub fn state(&self) -> SyncState<T> {
    self.rx.borrow().clone()
  }

  /// Wait for the next state change. Returns false once the entry is gone.
  #[cfg(test)]
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }

  /// Wait until the state satisfies `f` and return it.
  pub async fn wait_for(
    &mut self,
    f: impl FnMut(&SyncState<T>) -> bool,
  ) -> Result<SyncState<T>, FetchError> {
    self
      .rx
      .wait_for(f)
      .await
      .map(|state| (*state).clone())
      .map_err(|_| FetchError::Cancelled)
  }

  /// The shared outcome of the key's request: data or the surfaced error.
  pub async fn settled(&mut self) -> Result<Arc<T>, FetchError> {
    let state = self.wait_for(|state| state.phase.is_settled()).await?;
    state.outcome().unwrap_or(Err(FetchError::Cancelled))
  }
}

/// Cloneable entry point to the coordinator
pub struct SyncHandle<T> {
  store: CacheStore<T>,
  commands: mpsc::UnboundedSender<Command>,
}

impl<T> Clone for SyncHandle<T> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
      commands: self.commands.clone(),
    }
  }
}

impl<T: Clone + Send + Sync + 'static> SyncHandle<T> {
  /// Start the coordinator task over `store`, fetching with `fetcher`.
  ///
  /// The task stops when the last handle is dropped.
  pub fn spawn<F, Fut>(store: CacheStore<T>, config: SyncConfig, fetcher: F) -> Self
  where
    F: Fn(RequestKey) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();
    let fetcher: FetcherFn<T> = Arc::new(move |key: RequestKey| fetcher(key).boxed());

    let coordinator = Coordinator {
      store: store.clone(),
      registry: InFlightRegistry::new(),
      config,
      fetcher,
      completions: completions_tx,
      listeners: Vec::new(),
      online: true,
    };
    tokio::spawn(coordinator.run(commands_rx, completions_rx));

    Self {
      store,
      commands: commands_tx,
    }
  }

  #[cfg(test)]
  pub fn store(&self) -> &CacheStore<T> {
    &self.store
  }

  /// Subscribe to a key. The cached state (if any) is visible at once;
  /// whether a request is issued is decided by the coordinator.
  pub fn subscribe(&self, key: RequestKey) -> Subscription<T> {
    let rx = self.store.subscribe(&key);
    self.send(Command::Activate(key.clone()));
    Subscription { key, rx }
  }

  /// Manual revalidation; a no-op while a request for the key is in flight.
  pub fn revalidate(&self, key: &RequestKey) {
    self.send(Command::Revalidate(key.clone()));
  }

  /// Refetch now, superseding any in-flight request for the key.
  pub fn refetch(&self, key: &RequestKey) {
    self.send(Command::Refetch(key.clone()));
  }

  /// The consuming view regained focus.
  pub fn focus_gained(&self) {
    self.send(Command::FocusGained);
  }

  /// Report network connectivity; an offline to online transition
  /// revalidates every subscribed key.
  pub fn connectivity_changed(&self, online: bool) {
    self.send(Command::Connectivity(online));
  }

  /// Register a listener for coordinator events.
  pub fn listen(&self) -> mpsc::UnboundedReceiver<SyncEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.send(Command::Listen(tx));
    rx
  }

  fn send(&self, command: Command) {
    if self.commands.send(command).is_err() {
      warn!("sync coordinator is no longer running");
    }
  }
}

struct Coordinator<T> {
  store: CacheStore<T>,
  registry: InFlightRegistry,
  config: SyncConfig,
  fetcher: FetcherFn<T>,
  completions: mpsc::UnboundedSender<Completion<T>>,
  listeners: Vec<mpsc::UnboundedSender<SyncEvent>>,
  online: bool,
}

impl<T: Clone + Send + Sync + 'static> Coordinator<T> {
  async fn run(
    mut self,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut completions: mpsc::UnboundedReceiver<Completion<T>>,
  ) {
    loop {
      tokio::select! {
        command = commands.recv() => match command {
          Some(command) => self.handle_command(command),
          None => break,
        },
        Some(completion) = completions.recv() => self.handle_completion(completion),
      }
    }

    self.registry.abort_all();
    debug!("sync coordinator stopped");
  }

  fn handle_command(&mut self, command: Command) {
    match command {
      Command::Activate(key) => self.activate(key),
      Command::Revalidate(key) => self.revalidate(&key, Trigger::Manual),
      Command::Refetch(key) => self.refetch(key),
      Command::FocusGained => {
        if self.config.revalidate_on_focus {
          self.revalidate_subscribed(Trigger::Focus);
        }
      }
      Command::Connectivity(online) => self.set_online(online),
      Command::Listen(listener) => self.listeners.push(listener),
    }
  }

  fn handle_completion(&mut self, completion: Completion<T>) {
    match completion {
      Completion::Fetched {
        key,
        generation,
        result,
      } => self.complete(key, generation, result),
      Completion::RetryDue { key, generation } => self.retry(key, generation),
    }
  }

  fn activate(&mut self, key: RequestKey) {
    self.prune();

    if self.store.subscribers(&key) == 0 {
      debug!(%key, "subscription released before activation");
      return;
    }
    if self.registry.contains(&key) {
      debug!(%key, "attached to in-flight request");
      return;
    }
    if self.within_dedup_window(&key) {
      debug!(%key, "served from cache within dedup window");
      return;
    }

    let has_data = self
      .store
      .get(&key)
      .is_some_and(|state| state.data.is_some());
    if has_data && !self.config.revalidate_if_stale {
      debug!(%key, "served stale cache, revalidate_if_stale is off");
      return;
    }

    self.start(key, Trigger::Mount);
  }

  fn revalidate(&mut self, key: &RequestKey, trigger: Trigger) {
    if self.registry.contains(key) {
      debug!(%key, ?trigger, "revalidation skipped, request in flight");
      return;
    }
    if self.store.subscribers(key) == 0 {
      debug!(%key, ?trigger, "revalidation skipped, no subscribers");
      return;
    }
    self.start(key.clone(), trigger);
  }

  fn revalidate_subscribed(&mut self, trigger: Trigger) {
    for key in self.store.subscribed_keys() {
      self.revalidate(&key, trigger);
    }
  }

  fn refetch(&mut self, key: RequestKey) {
    if let Some(previous) = self.registry.remove(&key) {
      debug!(%key, generation = previous.generation, "superseding in-flight request");
    }
    self.start(key, Trigger::Refetch);
  }

  fn set_online(&mut self, online: bool) {
    let was_online = std::mem::replace(&mut self.online, online);
    match (was_online, online) {
      (false, true) => {
        info!("network connectivity regained");
        if self.config.revalidate_on_reconnect {
          self.revalidate_subscribed(Trigger::Reconnect);
        }
      }
      (true, false) => warn!("network connectivity lost"),
      _ => {}
    }
  }

  fn start(&mut self, key: RequestKey, trigger: Trigger) {
    let generation = self.registry.next_generation();

    let mut phase = FetchPhase::Loading;
    self.store.start(&key, |state| {
      state.begin();
      phase = state.phase;
    });
    let kind = if phase == FetchPhase::Validating {
      FetchKind::Revalidate
    } else {
      FetchKind::Load
    };

    let task = self.spawn_fetch(key.clone(), generation);
    self.registry.insert(key.clone(), generation, kind, task);
    debug!(%key, ?trigger, ?kind, generation, "request started");

    self.emit(SyncEvent::FetchStarted {
      key: key.clone(),
      attempt: 1,
      trigger,
    });
    self.emit(SyncEvent::Updated { key, phase });
  }

  fn complete(&mut self, key: RequestKey, generation: u64, result: Result<T, FetchError>) {
    if !self.registry.is_current(&key, generation) {
      debug!(%key, generation, "discarding superseded response");
      return;
    }
    let (attempt, kind) = match self.registry.get(&key) {
      Some(request) => (request.attempt, request.kind),
      None => return,
    };

    match result {
      Ok(data) => {
        self.registry.remove(&key);
        self.store.update(&key, |state| state.succeed(data));
        debug!(%key, attempt, "request succeeded");
        self.emit(SyncEvent::Updated {
          key,
          phase: FetchPhase::Success,
        });
      }
      Err(err) if kind == FetchKind::Revalidate => {
        self.registry.remove(&key);
        warn!(%key, error = %err, "revalidation failed, keeping cached data");
        self.store.update(&key, |state| state.fail_validation(err));
        self.emit(SyncEvent::Updated {
          key,
          phase: FetchPhase::Success,
        });
      }
      Err(err) if attempt < self.config.max_attempts => {
        let delay = self.config.retry_interval;
        warn!(
          %key,
          attempt,
          network = err.is_network(),
          error = %err,
          ?delay,
          "request failed, retrying"
        );
        let task = self.spawn_retry(key.clone(), generation, delay);
        self.registry.replace_task(&key, attempt + 1, task);
        self.emit(SyncEvent::RetryScheduled {
          key,
          attempt: attempt + 1,
          delay,
        });
      }
      Err(err) => {
        self.registry.remove(&key);
        error!(%key, attempt, error = %err, "request failed, retries exhausted");
        self.store.update(&key, |state| state.fail(err));
        self.emit(SyncEvent::Updated {
          key,
          phase: FetchPhase::Error,
        });
      }
    }
  }

  fn retry(&mut self, key: RequestKey, generation: u64) {
    if !self.registry.is_current(&key, generation) {
      debug!(%key, generation, "dropping retry for superseded request");
      return;
    }
    let attempt = self.registry.get(&key).map_or(1, |request| request.attempt);

    self.store.start(&key, |state| state.begin());
    let task = self.spawn_fetch(key.clone(), generation);
    self.registry.replace_task(&key, attempt, task);
    debug!(%key, attempt, "retrying request");

    self.emit(SyncEvent::FetchStarted {
      key,
      attempt,
      trigger: Trigger::Retry,
    });
  }

  fn spawn_fetch(&self, key: RequestKey, generation: u64) -> JoinHandle<()> {
    let request = (self.fetcher)(key.clone());
    let completions = self.completions.clone();
    tokio::spawn(async move {
      let result = request.await;
      // fails only once the coordinator has stopped
      let _ = completions.send(Completion::Fetched {
        key,
        generation,
        result,
      });
    })
  }

  fn spawn_retry(&self, key: RequestKey, generation: u64, delay: Duration) -> JoinHandle<()> {
    let completions = self.completions.clone();
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let _ = completions.send(Completion::RetryDue { key, generation });
    })
  }

  fn within_dedup_window(&self, key: &RequestKey) -> bool {
    self
      .store
      .started_at(key)
      .is_some_and(|started| started.elapsed() < self.config.dedup_interval)
  }

  /// Evict entries nobody watches, nothing is fetching, and whose dedup
  /// window has passed.
  fn prune(&mut self) {
    let registry = &self.registry;
    let dedup_interval = self.config.dedup_interval;
    self.store.retain(|key, subscribers, started_at| {
      subscribers > 0
        || registry.contains(key)
        || started_at.is_some_and(|started| started.elapsed() < dedup_interval)
    });
  }

  fn emit(&mut self, event: SyncEvent) {
    self
      .listeners
      .retain(|listener| listener.send(event.clone()).is_ok());
  }
}
