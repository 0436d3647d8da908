use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::feed::FeedSnapshot;

/// "Showing N post(s)" plus the owner, once posts are on screen.
pub fn results_text(snapshot: &FeedSnapshot) -> Option<String> {
  let count = snapshot.post_count();
  if snapshot.is_loading || snapshot.error.is_some() || count == 0 {
    return None;
  }

  let mut text = format!("Showing {} post{}", count, if count == 1 { "" } else { "s" });
  if let Some(owner) = snapshot.owner {
    text.push_str(&format!(" for user ID {}", owner));
  }
  Some(text)
}

/// Background refresh indicator, hidden during a first load.
pub fn is_updating(snapshot: &FeedSnapshot) -> bool {
  snapshot.is_validating && !snapshot.is_loading
}

/// Draw the footer bar: result count on the left, refresh state on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, snapshot: &FeedSnapshot) {
  let mut spans = vec![Span::raw(" ")];

  if let Some(text) = results_text(snapshot) {
    spans.push(Span::styled(text, Style::default().fg(Color::White)));
  }
  if is_updating(snapshot) {
    spans.push(Span::raw("  "));
    spans.push(Span::styled("Updating...", Style::default().fg(Color::Cyan).bold()));
  }

  let line = Line::from(spans);
  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
