use crate::ui::renderfns::{status_color, truncate};
use qa_deck::report::fields;
use qa_deck::{PageResult, Report};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

const HEADERS: [&str; 6] = ["Title", "Project", "Portfolio", "Sprint", "Date", "Status"];

fn report_row(report: &Report) -> Row<'static> {
  let dash = || "-".to_string();
  let status = fields::status(report).unwrap_or_else(dash);
  let date = fields::report_date(report)
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(dash);

  Row::new(vec![
    Cell::from(truncate(&fields::title(report).unwrap_or_else(dash), 40)),
    Cell::from(truncate(&fields::project(report).unwrap_or_else(dash), 20))
      .style(Style::default().fg(Color::Cyan)),
    Cell::from(truncate(&fields::portfolio(report).unwrap_or_else(dash), 20)),
    Cell::from(fields::sprint(report).unwrap_or_else(dash)),
    Cell::from(date),
    Cell::from(status.clone()).style(Style::default().fg(status_color(&status))),
  ])
}

/// Draw the current page of reports
pub fn draw_report_table(
  frame: &mut Frame,
  area: Rect,
  page: &PageResult,
  state: &mut TableState,
  loading: bool,
) {
  let title = if loading {
    " Reports (loading...) ".to_string()
  } else {
    format!(" Reports ({}) ", page.total)
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if page.is_empty() {
    let content = if loading {
      "Loading reports..."
    } else {
      "No reports match. Press 'r' to refresh or :clear to drop filters."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h)))
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

  let widths = [
    Constraint::Percentage(32),
    Constraint::Percentage(16),
    Constraint::Percentage(16),
    Constraint::Length(8),
    Constraint::Length(11),
    Constraint::Min(10),
  ];

  let table = Table::new(page.reports.iter().map(report_row), widths)
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(table, area, state);
}
