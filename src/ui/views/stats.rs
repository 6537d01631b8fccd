use qa_deck::api::{DashboardStats, OVERALL_COUNTERS};
use qa_deck::cache::{CacheResult, CacheSource};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// "totalTestCases" -> "Total test cases"
fn counter_label(name: &str) -> String {
  let mut label = String::new();
  for (i, c) in name.chars().enumerate() {
    if c.is_uppercase() {
      label.push(' ');
      label.extend(c.to_lowercase());
    } else if i == 0 {
      label.extend(c.to_uppercase());
    } else {
      label.push(c);
    }
  }
  label
}

fn source_label(stats: &CacheResult<DashboardStats>) -> String {
  match stats.source {
    CacheSource::Network => "live".to_string(),
    CacheSource::CacheFresh => match stats.age {
      Some(age) => format!("cached {}s ago", age.as_secs()),
      None => "cached".to_string(),
    },
    CacheSource::Fallback => "unavailable".to_string(),
  }
}

/// Draw the dashboard counters as a centered popup
pub fn draw_stats(frame: &mut Frame, area: Rect, stats: Option<&CacheResult<DashboardStats>>) {
  let width = 46.min(area.width);
  let height = (OVERALL_COUNTERS.len() as u16 + 4).min(area.height);
  let popup = Rect::new(
    area.x + area.width.saturating_sub(width) / 2,
    area.y + area.height.saturating_sub(height) / 2,
    width,
    height,
  );

  frame.render_widget(Clear, popup);

  let title = match stats {
    Some(stats) => format!(" Dashboard ({}) ", source_label(stats)),
    None => " Dashboard (loading...) ".to_string(),
  };
  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Magenta));

  let Some(stats) = stats else {
    frame.render_widget(Paragraph::new("").block(block), popup);
    return;
  };

  let mut lines: Vec<Line> = OVERALL_COUNTERS
    .iter()
    .map(|name| {
      Line::from(vec![
        Span::styled(
          format!(" {:<30}", counter_label(name)),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
          stats.data.count(name).to_string(),
          Style::default().fg(Color::White).bold(),
        ),
      ])
    })
    .collect();
  lines.push(Line::from(Span::styled(
    format!(" {} projects tracked", stats.data.projects.len()),
    Style::default().fg(Color::Cyan),
  )));

  frame.render_widget(Paragraph::new(lines).block(block), popup);
}
