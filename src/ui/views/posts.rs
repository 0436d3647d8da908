use crate::api::{OwnerId, Post};
use crate::feed::FeedSnapshot;
use crate::ui::renderfns::{single_line, truncate};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

pub const LOADING_TEXT: &str = "Loading posts...";
pub const ERROR_TEXT: &str = "Error loading posts. Please try again.";

/// Rows a page scroll moves
const PAGE: u16 = 5;

/// What the body area shows for a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyContent {
  /// Loading and/or error banners; both can be up at once
  Status { loading: bool, error: bool },
  Posts,
  Empty {
    heading: &'static str,
    detail: String,
  },
}

pub fn body_content(snapshot: &FeedSnapshot) -> BodyContent {
  let error = snapshot.error.is_some();
  if snapshot.is_loading || error {
    return BodyContent::Status {
      loading: snapshot.is_loading,
      error,
    };
  }
  if snapshot.post_count() > 0 {
    return BodyContent::Posts;
  }
  let (heading, detail) = empty_message(snapshot.owner);
  BodyContent::Empty { heading, detail }
}

fn empty_message(owner: Option<OwnerId>) -> (&'static str, String) {
  match owner {
    Some(owner) => (
      "No posts found",
      format!("No posts found for user ID {}", owner),
    ),
    None => (
      "No posts available",
      "There are currently no posts to display".to_string(),
    ),
  }
}

/// Scrollable list of post cards
#[derive(Debug, Default)]
pub struct PostsView {
  list_state: ListState,
}

impl PostsView {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn scroll_down(&mut self) {
    self.list_state.select_next();
  }

  pub fn scroll_up(&mut self) {
    self.list_state.select_previous();
  }

  pub fn page_down(&mut self) {
    self.list_state.scroll_down_by(PAGE);
  }

  pub fn page_up(&mut self) {
    self.list_state.scroll_up_by(PAGE);
  }

  /// Back to the top, e.g. after the owner filter changed
  pub fn reset(&mut self) {
    self.list_state = ListState::default();
  }

  pub fn render(&mut self, frame: &mut Frame, area: Rect, snapshot: &FeedSnapshot) {
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    match body_content(snapshot) {
      BodyContent::Status { loading, error } => {
        let mut lines = vec![Line::raw("")];
        if loading {
          lines.push(Line::styled(LOADING_TEXT, Style::default().fg(Color::Cyan)));
        }
        if error {
          lines.push(Line::styled(ERROR_TEXT, Style::default().fg(Color::Red)));
        }
        let paragraph = Paragraph::new(lines)
          .alignment(Alignment::Center)
          .block(block);
        frame.render_widget(paragraph, area);
      }
      BodyContent::Empty { heading, detail } => {
        let lines = vec![
          Line::raw(""),
          Line::styled(heading, Style::default().fg(Color::Gray).bold()),
          Line::styled(detail, Style::default().fg(Color::DarkGray)),
        ];
        let paragraph = Paragraph::new(lines)
          .alignment(Alignment::Center)
          .wrap(Wrap { trim: true })
          .block(block);
        frame.render_widget(paragraph, area);
      }
      BodyContent::Posts => {
        let posts = snapshot.posts.as_deref().map_or(&[][..], |posts| posts.as_slice());
        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = posts.iter().map(|post| post_card(post, width)).collect();

        if self
          .list_state
          .selected()
          .is_some_and(|selected| selected >= items.len())
        {
          self.list_state.select(Some(items.len().saturating_sub(1)));
        }

        let list = List::new(items)
          .block(block)
          .highlight_style(Style::default().bg(Color::DarkGray))
          .highlight_symbol("▌");
        frame.render_stateful_widget(list, area, &mut self.list_state);
      }
    }
  }
}

/// Title with owner badge, body, and post id, followed by a spacer row
fn post_card(post: &Post, width: usize) -> ListItem<'static> {
  let badge = format!(" User {} ", post.owner_id);
  let title_width = width.saturating_sub(badge.chars().count() + 1);

  let lines = vec![
    Line::from(vec![
      Span::styled(
        truncate(&single_line(&post.title), title_width),
        Style::default().fg(Color::White).bold(),
      ),
      Span::raw(" "),
      Span::styled(badge, Style::default().fg(Color::Black).bg(Color::Cyan)),
    ]),
    Line::styled(
      truncate(&single_line(&post.body), width),
      Style::default().fg(Color::Gray),
    ),
    Line::styled(
      format!("Post ID: {}", post.id),
      Style::default().fg(Color::DarkGray),
    ),
    Line::raw(""),
  ];
  ListItem::new(lines)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::FetchError;
  use ratatui::backend::TestBackend;
  use std::sync::Arc;

  fn post(id: u64, owner_id: u64) -> Post {
    Post {
      id,
      owner_id,
      title: format!("title {}", id),
      body: "line one\nline two".to_string(),
    }
  }

  fn snapshot_with(posts: Vec<Post>) -> FeedSnapshot {
    FeedSnapshot {
      posts: Some(Arc::new(posts)),
      ..FeedSnapshot::default()
    }
  }

  fn render(snapshot: &FeedSnapshot) -> String {
    let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
    let mut view = PostsView::new();
    terminal
      .draw(|frame| view.render(frame, frame.area(), snapshot))
      .unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer
      .content()
      .chunks(buffer.area.width as usize)
      .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n")
  }

  #[test]
  fn test_loading_and_error_can_show_together() {
    let snapshot = FeedSnapshot {
      is_loading: true,
      error: Some(FetchError::Network("down".into())),
      ..FeedSnapshot::default()
    };
    assert_eq!(
      body_content(&snapshot),
      BodyContent::Status {
        loading: true,
        error: true
      }
    );
  }

  #[test]
  fn test_empty_messages() {
    assert_eq!(
      body_content(&FeedSnapshot::default()),
      BodyContent::Empty {
        heading: "No posts available",
        detail: "There are currently no posts to display".to_string(),
      }
    );

    let filtered = FeedSnapshot {
      owner: OwnerId::new(11),
      posts: Some(Arc::new(Vec::new())),
      ..FeedSnapshot::default()
    };
    assert_eq!(
      body_content(&filtered),
      BodyContent::Empty {
        heading: "No posts found",
        detail: "No posts found for user ID 11".to_string(),
      }
    );
  }

  #[test]
  fn test_posts_shown_when_settled() {
    assert_eq!(body_content(&snapshot_with(vec![post(1, 1)])), BodyContent::Posts);
  }

  #[test]
  fn test_renders_cards() {
    let screen = render(&snapshot_with(vec![post(1, 1), post(2, 4)]));
    assert!(screen.contains("title 1"));
    assert!(screen.contains("User 4"));
    assert!(screen.contains("line one line two"));
    assert!(screen.contains("Post ID: 2"));
  }

  #[test]
  fn test_renders_loading_banner() {
    let snapshot = FeedSnapshot {
      is_loading: true,
      ..FeedSnapshot::default()
    };
    let screen = render(&snapshot);
    assert!(screen.contains(LOADING_TEXT));
    assert!(!screen.contains(ERROR_TEXT));
  }
}
