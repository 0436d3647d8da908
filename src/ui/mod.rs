pub mod components;
pub mod renderfns;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const SUBTITLE: &str = "Browse and filter posts from our community";

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(1), // Subtitle
      Constraint::Length(3), // Filter input
      Constraint::Min(1),    // Posts
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let snapshot = app.snapshot();

  renderfns::draw_header(frame, chunks[0], app.title(), app.api_url());
  frame.render_widget(
    Paragraph::new(SUBTITLE).style(Style::default().fg(Color::DarkGray)),
    chunks[1],
  );
  app
    .filter_input()
    .render(frame, chunks[2], snapshot.is_loading);
  app.posts_view().render(frame, chunks[3], &snapshot);
  renderfns::draw_footer(frame, chunks[4], &snapshot);

  if app.is_slow() {
    components::draw_slow_notice(frame, frame.area());
  }
}
