use ratatui::prelude::Color;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for a report's testing status
pub fn status_color(status: &str) -> Color {
  match status.to_lowercase().as_str() {
    "passed" | "completed" | "done" => Color::Green,
    "failed" | "blocked" => Color::Red,
    "passed with issues" | "passed-with-issues" | "in progress" | "in-progress" => Color::Yellow,
    "pending" | "not started" => Color::Blue,
    _ => Color::White,
  }
}
