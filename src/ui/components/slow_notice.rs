use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub const SLOW_TITLE: &str = "Slow Connection Detected";
pub const SLOW_MESSAGE: &str = "Your request is taking longer than expected. This might be due to a slow internet connection.";

/// Draw the slow connection notice in the top-right corner of `area`
pub fn draw_slow_notice(frame: &mut Frame, area: Rect) {
  let width = (area.width * 40 / 100).clamp(30, 48).min(area.width);
  let height = 6.min(area.height);
  let x = area.x + area.width.saturating_sub(width + 1);
  let y = area.y + 1u16.min(area.height.saturating_sub(height));

  let overlay_area = Rect::new(x, y, width, height);

  // Clear the area behind the overlay
  frame.render_widget(Clear, overlay_area);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(Span::styled(
      format!(" {} ", SLOW_TITLE),
      Style::default().fg(Color::Yellow).bold(),
    ))
    .title_bottom(Line::from(vec![
      Span::styled("<ctrl-d>", Style::default().fg(Color::Cyan)),
      Span::styled(" dismiss ", Style::default().fg(Color::DarkGray)),
    ]));

  let paragraph = Paragraph::new(SLOW_MESSAGE)
    .style(Style::default().fg(Color::Yellow))
    .wrap(Wrap { trim: true })
    .block(block);
  frame.render_widget(paragraph, overlay_area);
}
