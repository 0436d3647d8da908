use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

const PLACEHOLDER: &str = "Enter user ID to filter posts...";

/// Events emitted by the filter input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
  /// Raw text changed (emitted on each edit)
  Changed(String),
  /// Cleared with Esc; applied without waiting for the debounce
  Cleared,
}

/// Always-focused single line input for the owner filter
#[derive(Debug, Clone, Default)]
pub struct FilterInput {
  buffer: String,
  /// Cursor position in chars
  cursor: usize,
}

impl FilterInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Input pre-filled with `value`, cursor at the end
  pub fn with_value(value: impl Into<String>) -> Self {
    let buffer = value.into();
    let cursor = buffer.chars().count();
    Self { buffer, cursor }
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  fn byte_index(&self, cursor: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(cursor)
      .map_or(self.buffer.len(), |(i, _)| i)
  }

  fn changed(&self) -> KeyResult<FilterEvent> {
    KeyResult::Event(FilterEvent::Changed(self.buffer.clone()))
  }

  /// Handle a key event. Control chords other than Ctrl-U are left to the
  /// caller.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => {
        if self.is_empty() {
          return KeyResult::Handled;
        }
        self.clear();
        KeyResult::Event(FilterEvent::Cleared)
      }
      KeyCode::Char('u') if ctrl => {
        // Clear line before cursor
        let at = self.byte_index(self.cursor);
        self.buffer.replace_range(..at, "");
        self.cursor = 0;
        self.changed()
      }
      KeyCode::Char(_) if ctrl => KeyResult::NotHandled,
      KeyCode::Char(c) => {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        self.changed()
      }
      KeyCode::Backspace => {
        if self.cursor == 0 {
          return KeyResult::Handled;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.buffer.remove(at);
        self.changed()
      }
      KeyCode::Delete => {
        if self.cursor >= self.buffer.chars().count() {
          return KeyResult::Handled;
        }
        let at = self.byte_index(self.cursor);
        self.buffer.remove(at);
        self.changed()
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        KeyResult::Handled
      }
      KeyCode::Right => {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
        KeyResult::Handled
      }
      KeyCode::Home => {
        self.cursor = 0;
        KeyResult::Handled
      }
      KeyCode::End => {
        self.cursor = self.buffer.chars().count();
        KeyResult::Handled
      }
      _ => KeyResult::NotHandled,
    }
  }

  /// Render the input box. `disabled` dims it while the feed is loading.
  pub fn render(&self, frame: &mut Frame, area: Rect, disabled: bool) {
    let border = if disabled { Color::DarkGray } else { Color::Yellow };
    let title = if disabled {
      " Filter by user ID (loading...) "
    } else {
      " Filter by user ID "
    };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border))
      .title(title);

    let line = if self.is_empty() {
      Line::from(vec![
        Span::styled("_", Style::default().fg(border)),
        Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
      ])
    } else {
      let (before, after) = self.value().split_at(self.byte_index(self.cursor));
      Line::from(vec![
        Span::raw(before),
        Span::styled("_", Style::default().fg(border)), // Cursor
        Span::raw(after),
      ])
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl_key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
  }

  fn type_str(input: &mut FilterInput, s: &str) {
    for c in s.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_typing_emits_changed() {
    let mut input = FilterInput::new();
    assert_eq!(
      input.handle_key(key(KeyCode::Char('1'))),
      KeyResult::Event(FilterEvent::Changed("1".to_string()))
    );
    type_str(&mut input, "2");
    assert_eq!(input.value(), "12");
  }

  #[test]
  fn test_escape_clears() {
    let mut input = FilterInput::with_value("42");
    assert_eq!(
      input.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FilterEvent::Cleared)
    );
    assert!(input.is_empty());
    // nothing left to clear
    assert_eq!(input.handle_key(key(KeyCode::Esc)), KeyResult::Handled);
  }

  #[test]
  fn test_backspace_and_cursor() {
    let mut input = FilterInput::new();
    type_str(&mut input, "13");
    input.handle_key(key(KeyCode::Left));
    type_str(&mut input, "2");
    assert_eq!(input.value(), "123");

    input.handle_key(key(KeyCode::End));
    assert_eq!(
      input.handle_key(key(KeyCode::Backspace)),
      KeyResult::Event(FilterEvent::Changed("12".to_string()))
    );
    input.handle_key(key(KeyCode::Home));
    assert_eq!(input.handle_key(key(KeyCode::Backspace)), KeyResult::Handled);
  }

  #[test]
  fn test_delete_at_cursor() {
    let mut input = FilterInput::with_value("7x");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Delete));
    assert_eq!(input.value(), "7");
    assert_eq!(input.handle_key(key(KeyCode::Delete)), KeyResult::Handled);
  }

  #[test]
  fn test_ctrl_u_clears_before_cursor() {
    let mut input = FilterInput::with_value("12ab");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Left));
    input.handle_key(ctrl_key(KeyCode::Char('u')));
    assert_eq!(input.value(), "ab");
  }

  #[test]
  fn test_control_chords_pass_through() {
    let mut input = FilterInput::new();
    assert_eq!(
      input.handle_key(ctrl_key(KeyCode::Char('r'))),
      KeyResult::NotHandled
    );
    assert_eq!(input.handle_key(key(KeyCode::Up)), KeyResult::NotHandled);
    assert!(input.is_empty());
  }

  #[test]
  fn test_multibyte_input() {
    let mut input = FilterInput::new();
    type_str(&mut input, "é1");
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "é");
  }
}
