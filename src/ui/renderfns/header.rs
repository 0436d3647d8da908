use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with title, API host, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, api_url: &str) {
  let domain = extract_domain(api_url);

  let header = Line::from(vec![
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)),
    Span::raw("  "),
    // Shortcuts - keys highlighted, descriptions dimmed
    Span::styled("<esc>", Style::default().fg(Color::Cyan)),
    Span::styled(" clear", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<ctrl-r>", Style::default().fg(Color::Cyan)),
    Span::styled(" refresh", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<ctrl-f>", Style::default().fg(Color::Cyan)),
    Span::styled(" refetch", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<ctrl-q>", Style::default().fg(Color::Cyan)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Host (and port) part of an http(s) URL
fn extract_domain(url: &str) -> &str {
  let rest = url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url);
  rest.split('/').next().unwrap_or(rest)
}
