use crate::api::{OwnerId, Post, PostsClient};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::feed::{FeedSnapshot, PostsFeed};
use crate::filter::KeyController;
use crate::stall::StallTimer;
use crate::sync::{CacheStore, SyncEvent, SyncHandle};
use crate::ui::components::{FilterEvent, FilterInput, KeyResult};
use crate::ui::renderfns::single_line;
use crate::ui::views::PostsView;
use crate::{net, ui};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Start the coordinator over the configured HTTP client.
fn spawn_sync(config: &Config) -> Result<SyncHandle<Vec<Post>>> {
  let client = PostsClient::new()?;
  Ok(SyncHandle::spawn(CacheStore::new(), config.sync_config(), move |key| {
    let client = client.clone();
    async move { client.fetch_posts(&key).await }
  }))
}

/// Load the posts for `owner` once, retries included, and print them to
/// stdout without starting the terminal UI.
pub async fn print_once(config: &Config, owner: Option<OwnerId>) -> Result<()> {
  let endpoint = config.endpoint()?;
  let sync = spawn_sync(config)?;
  let mut subscription = sync.subscribe(endpoint.request_key(owner));

  let posts = subscription
    .settled()
    .await
    .map_err(|e| eyre!("Failed to load posts: {}", e))?;
  info!(key = %subscription.key(), count = posts.len(), "printing posts");

  let mut out = stdout().lock();
  write_posts(&mut out, &posts)?;
  out.flush()?;
  Ok(())
}

fn write_posts(out: &mut impl Write, posts: &[Post]) -> std::io::Result<()> {
  if posts.is_empty() {
    writeln!(out, "No posts found")?;
  }
  for post in posts {
    writeln!(out, "#{} [User {}] {}", post.id, post.owner_id, single_line(&post.title))?;
  }
  Ok(())
}

/// Main application state
pub struct App {
  /// Application configuration
  config: Config,

  /// Coordinator handle, for focus and connectivity triggers
  sync: SyncHandle<Vec<Post>>,

  /// Active owner query
  feed: PostsFeed,

  /// Debounces filter edits into owner changes
  filter: KeyController,

  /// Filter text box
  filter_input: FilterInput,

  /// Slow connection detection for the active query
  stall: StallTimer,

  posts_view: PostsView,

  /// Coordinator events, used to wake the loop for redraws
  sync_events: mpsc::UnboundedReceiver<SyncEvent>,

  /// Owner shown in the last drawn frame
  shown_owner: Option<OwnerId>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, initial_owner: Option<OwnerId>) -> Result<Self> {
    let endpoint = config.endpoint()?;
    let sync = spawn_sync(&config)?;
    let sync_events = sync.listen();

    let feed = PostsFeed::new(sync.clone(), endpoint, initial_owner);
    let on_change = feed.clone();
    let filter = KeyController::new(config.ui.debounce(), move |owner| on_change.set_owner(owner))
      .with_initial(initial_owner);
    let filter_input = initial_owner
      .map(|owner| FilterInput::with_value(owner.to_string()))
      .unwrap_or_else(FilterInput::new);
    let stall = StallTimer::new(config.ui.stall());

    info!(api = %feed.endpoint().base(), owner = ?initial_owner, "starting");

    Ok(Self {
      config,
      sync,
      feed,
      filter,
      filter_input,
      stall,
      posts_view: PostsView::new(),
      sync_events,
      shown_owner: initial_owner,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.start_probe(events.sender());

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    stdout().execute(DisableFocusChange)?;
    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      self.observe_feed();

      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      tokio::select! {
        event = events.next() => match event {
          Some(event) => self.handle_event(event),
          None => break,
        },
        Some(event) = self.sync_events.recv() => {
          debug!(?event, "sync event");
        }
        _ = self.filter.debounce_elapsed(), if self.filter.is_pending() => {
          self.filter.poll();
        }
        _ = self.stall.elapsed(), if self.stall.is_armed() => {
          self.stall.poll();
        }
      }
    }

    Ok(())
  }

  fn start_probe(&self, tx: mpsc::UnboundedSender<Event>) {
    if !self.config.connectivity.enabled {
      return;
    }
    match self.feed.endpoint().probe_addr() {
      Some((host, port)) => {
        net::spawn_probe(host, port, self.config.connectivity.probe_interval(), tx);
      }
      None => debug!("no host to probe, connectivity checks disabled"),
    }
  }

  /// Feed the active query's signals to the stall timer and reset the
  /// scroll position when the owner changed.
  fn observe_feed(&mut self) {
    let snapshot = self.feed.snapshot();
    self
      .stall
      .observe(snapshot.is_loading, snapshot.error.is_some());

    if snapshot.owner != self.shown_owner {
      self.shown_owner = snapshot.owner;
      self.posts_view.reset();
    }
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::FocusGained => {
        debug!("terminal focus gained");
        self.sync.focus_gained();
      }
      Event::Connectivity(online) => self.sync.connectivity_changed(online),
      Event::FocusLost | Event::Resize | Event::Tick => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
      match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') => {
          self.should_quit = true;
          return;
        }
        KeyCode::Char('r') => {
          info!("manual revalidation");
          self.feed.revalidate();
          return;
        }
        KeyCode::Char('f') => {
          info!("forced refetch");
          self.feed.refetch();
          return;
        }
        KeyCode::Char('d') => {
          self.stall.dismiss();
          return;
        }
        _ => {}
      }
    }

    match key.code {
      KeyCode::Down => return self.posts_view.scroll_down(),
      KeyCode::Up => return self.posts_view.scroll_up(),
      KeyCode::PageDown => return self.posts_view.page_down(),
      KeyCode::PageUp => return self.posts_view.page_up(),
      _ => {}
    }

    // Editing is disabled while the active query is loading
    if key.code != KeyCode::Esc && self.feed.snapshot().is_loading {
      return;
    }

    match self.filter_input.handle_key(key) {
      KeyResult::Event(FilterEvent::Changed(raw)) => self.filter.input(raw),
      KeyResult::Event(FilterEvent::Cleared) => self.filter.clear(),
      KeyResult::Handled | KeyResult::NotHandled => {}
    }
  }

  // Accessors for UI rendering

  pub fn snapshot(&self) -> FeedSnapshot {
    self.feed.snapshot()
  }

  pub fn title(&self) -> &str {
    &self.config.ui.title
  }

  pub fn api_url(&self) -> &str {
    self.feed.endpoint().base().as_str()
  }

  pub fn filter_input(&self) -> &FilterInput {
    &self.filter_input
  }

  pub fn posts_view(&mut self) -> &mut PostsView {
    &mut self.posts_view
  }

  pub fn is_slow(&self) -> bool {
    self.stall.is_slow()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn post(id: u64, owner_id: u64, title: &str) -> Post {
    Post {
      id,
      owner_id,
      title: title.to_string(),
      body: String::new(),
    }
  }

  #[test]
  fn test_write_posts_one_line_each() {
    let mut out = Vec::new();
    write_posts(&mut out, &[post(1, 2, "first\ntitle"), post(7, 3, "second")]).unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "#1 [User 2] first title\n#7 [User 3] second\n"
    );
  }

  #[test]
  fn test_write_posts_empty() {
    let mut out = Vec::new();
    write_posts(&mut out, &[]).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "No posts found\n");
  }
}
