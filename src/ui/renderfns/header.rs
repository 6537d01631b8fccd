use qa_deck::PageResult;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, context, result counts and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, page: &PageResult, loading: bool) {
  let counts = if loading {
    " loading... ".to_string()
  } else {
    format!(
      " {} reports  page {}/{} ",
      page.total, page.page, page.total_pages
    )
  };

  let header = Line::from(vec![
    Span::styled(" qa-deck ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(counts, Style::default().fg(Color::Yellow).bold()),
    Span::raw("  "),
    // Shortcuts - keys and brackets highlighted, descriptions dimmed
    Span::styled("<:>", Style::default().fg(Color::Cyan)),
    Span::styled(" command", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("</>", Style::default().fg(Color::Cyan)),
    Span::styled(" search", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<n/p>", Style::default().fg(Color::Cyan)),
    Span::styled(" page", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
