use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Suggestion};
use crossterm::event::{KeyCode, KeyEvent};
use qa_deck::filter::FilterOptions;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_VISIBLE: usize = 8;

/// Events emitted by command input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Command submitted
  Submitted(String),
  /// Command cancelled
  Cancelled,
}

/// Command input component with autocomplete
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  selected_suggestion: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if command mode is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Get the current input value
  pub fn value(&self) -> &str {
    self.input.value()
  }

  /// Activate command mode
  pub fn activate(&mut self) {
    self.active = true;
    self.reset_input();
  }

  fn reset_input(&mut self) {
    self.input.clear();
    self.selected_suggestion = 0;
  }

  /// Get autocomplete suggestions for current input
  pub fn suggestions(&self, options: &FilterOptions) -> Vec<Suggestion> {
    commands::suggestions(self.input.value(), options)
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent, options: &FilterOptions) -> KeyResult<CommandEvent> {
    // If not active, check for activation key
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    // Active - handle command-specific keys first
    match key.code {
      KeyCode::Esc => {
        self.active = false;
        self.reset_input();
        return KeyResult::Event(CommandEvent::Cancelled);
      }
      KeyCode::Enter => {
        let suggestions = self.suggestions(options);
        match suggestions.get(self.selected_suggestion) {
          // Completing a command name leaves the line open for its argument
          Some(s) if !s.submit => {
            self.input.set_value(&s.completion);
            self.selected_suggestion = 0;
            return KeyResult::Handled;
          }
          Some(s) => {
            let cmd = s.completion.clone();
            self.active = false;
            self.reset_input();
            return KeyResult::Event(CommandEvent::Submitted(cmd));
          }
          None => {
            let cmd = self.input.value().trim().to_string();
            self.active = false;
            self.reset_input();
            return KeyResult::Event(CommandEvent::Submitted(cmd));
          }
        }
      }
      KeyCode::Tab | KeyCode::Down => {
        let count = self.suggestions(options).len();
        if count > 0 {
          self.selected_suggestion = (self.selected_suggestion + 1) % count;
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        let count = self.suggestions(options).len();
        if count > 0 {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            count - 1
          } else {
            self.selected_suggestion - 1
          };
        }
        return KeyResult::Handled;
      }
      _ => {}
    }

    // Delegate to TextInput for text editing
    match self.input.handle_key(key) {
      InputResult::Consumed => {
        self.selected_suggestion = 0; // Reset on input change
        KeyResult::Handled
      }
      InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::Handled,
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Render the command overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, options: &FilterOptions) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions(options);

    let width = (area.width * 60 / 100).clamp(30, 70).min(area.width);
    let visible = suggestions.len().min(MAX_VISIBLE);
    let height = (3 + visible as u16).min(area.height);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);

    let (before, after) = self.input.split_at_cursor();
    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    if suggestions.is_empty() || chunks[1].height == 0 {
      return;
    }

    // Scroll so the selection stays visible
    let offset = self.selected_suggestion.saturating_sub(MAX_VISIBLE - 1);
    let items: Vec<ListItem> = suggestions
      .iter()
      .skip(offset)
      .take(MAX_VISIBLE)
      .map(|s| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<16}", s.label), Style::default().fg(Color::Cyan)),
          Span::styled(s.hint.clone(), Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected_suggestion - offset));

    frame.render_stateful_widget(list, chunks[1], &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn options() -> FilterOptions {
    FilterOptions {
      projects: vec!["Alpha".into(), "Beta".into()],
      ..Default::default()
    }
  }

  fn type_text(cmd: &mut CommandInput, text: &str) {
    for c in text.chars() {
      cmd.handle_key(key(KeyCode::Char(c)), &options());
    }
  }

  #[test]
  fn test_colon_activates() {
    let mut cmd = CommandInput::new();
    assert_eq!(cmd.handle_key(key(KeyCode::Char('x')), &options()), KeyResult::NotHandled);
    assert_eq!(cmd.handle_key(key(KeyCode::Char(':')), &options()), KeyResult::Handled);
    assert!(cmd.is_active());
  }

  #[test]
  fn test_enter_completes_command_then_value() {
    let mut cmd = CommandInput::new();
    cmd.activate();
    type_text(&mut cmd, "proj");

    assert_eq!(cmd.handle_key(key(KeyCode::Enter), &options()), KeyResult::Handled);
    assert_eq!(cmd.value(), "project ");
    assert!(cmd.is_active());

    type_text(&mut cmd, "be");
    assert_eq!(
      cmd.handle_key(key(KeyCode::Enter), &options()),
      KeyResult::Event(CommandEvent::Submitted("project Beta".into()))
    );
    assert!(!cmd.is_active());
  }

  #[test]
  fn test_enter_without_suggestions_submits_raw_input() {
    let mut cmd = CommandInput::new();
    cmd.activate();
    type_text(&mut cmd, "from 2024-01-01");
    assert_eq!(
      cmd.handle_key(key(KeyCode::Enter), &options()),
      KeyResult::Event(CommandEvent::Submitted("from 2024-01-01".into()))
    );
  }

  #[test]
  fn test_tab_cycles_selection() {
    let mut cmd = CommandInput::new();
    cmd.activate();
    type_text(&mut cmd, "project ");
    type_text(&mut cmd, "a");
    // "Alpha" and "Beta" both contain "a"
    cmd.handle_key(key(KeyCode::Tab), &options());
    assert_eq!(
      cmd.handle_key(key(KeyCode::Enter), &options()),
      KeyResult::Event(CommandEvent::Submitted("project Beta".into()))
    );
  }

  #[test]
  fn test_escape_cancels() {
    let mut cmd = CommandInput::new();
    cmd.activate();
    type_text(&mut cmd, "sta");
    assert_eq!(
      cmd.handle_key(key(KeyCode::Esc), &options()),
      KeyResult::Event(CommandEvent::Cancelled)
    );
    assert!(cmd.value().is_empty());
  }
}
