use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Search text changed (emitted on each keystroke, original text on cancel)
  Changed(String),
  /// Search submitted (overlay closed, run now)
  Submitted,
}

/// Search input component with activation/deactivation
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
  /// Text before the overlay opened, restored on cancel
  original: String,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if search is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the overlay pre-filled with the current search text
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.original = current.to_string();
    self.input.set_value(current);
  }

  /// Handle a key event while active
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    let before = self.input.value().to_string();
    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        let original = std::mem::take(&mut self.original);
        if original == self.input.value() {
          KeyResult::Handled
        } else {
          self.input.set_value(&original);
          KeyResult::Event(SearchEvent::Changed(original))
        }
      }
      InputResult::Consumed if self.input.value() != before => {
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      InputResult::Consumed => KeyResult::Handled,
      InputResult::NotHandled => match key.code {
        // Swallow everything else while the overlay is open
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => KeyResult::Handled,
        _ => KeyResult::NotHandled,
      },
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3.min(area.height));

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search title, project, portfolio ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let (before, after) = self.input.split_at_cursor();
    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_inactive_ignores_keys() {
    let mut search = SearchInput::new();
    assert_eq!(search.handle_key(key(KeyCode::Char('a'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_each_keystroke_reports_change() {
    let mut search = SearchInput::new();
    search.activate("");
    assert_eq!(
      search.handle_key(key(KeyCode::Char('a'))),
      KeyResult::Event(SearchEvent::Changed("a".into()))
    );
    assert_eq!(search.handle_key(key(KeyCode::Left)), KeyResult::Handled);
    assert_eq!(
      search.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(SearchEvent::Submitted)
    );
    assert!(!search.is_active());
  }

  #[test]
  fn test_cancel_restores_original() {
    let mut search = SearchInput::new();
    search.activate("alpha");
    search.handle_key(key(KeyCode::Backspace));
    assert_eq!(
      search.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(SearchEvent::Changed("alpha".into()))
    );

    search.activate("alpha");
    assert_eq!(search.handle_key(key(KeyCode::Esc)), KeyResult::Handled);
  }
}
