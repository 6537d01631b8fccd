use qa_deck::filter::ActiveFilter;
use qa_deck::{Notice, NoticeLevel};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the active filter chips, or a hint when nothing is filtered
pub fn draw_filter_chips(frame: &mut Frame, area: Rect, filters: &[ActiveFilter]) {
  let mut spans = vec![Span::raw(" ")];

  if filters.is_empty() {
    spans.push(Span::styled(
      "No filters  :project :status :sort ... to narrow down",
      Style::default().fg(Color::DarkGray),
    ));
  }

  for (i, filter) in filters.iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
      format!(" {}: {} ", filter.label, filter.value),
      Style::default().fg(Color::Black).bg(Color::Cyan),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn notice_color(level: NoticeLevel) -> Color {
  match level {
    NoticeLevel::Info => Color::Green,
    NoticeLevel::Warning => Color::Yellow,
    NoticeLevel::Error => Color::Red,
  }
}

/// Draw the status line: the oldest notice if any, otherwise key hints
pub fn draw_footer(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
  let line = match notice {
    Some(notice) => Line::from(vec![
      Span::styled(
        format!(" {} ", notice),
        Style::default().fg(notice_color(notice.level)),
      ),
      Span::styled("  <x> dismiss", Style::default().fg(Color::DarkGray)),
    ]),
    None => Line::from(Span::styled(
      " j/k:nav  n/p:page  r:refresh  :stats  :delete  Esc:close  Ctrl-C:quit",
      Style::default().fg(Color::DarkGray),
    )),
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
