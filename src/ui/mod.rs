pub mod components;
pub mod renderfns;
mod views;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(1), // Filter chips
      Constraint::Min(1),    // Report table
      Constraint::Length(1), // Status line
    ])
    .split(frame.area());

  renderfns::draw_header(
    frame,
    chunks[0],
    &app.title(),
    app.page(),
    app.is_loading(),
  );
  renderfns::draw_filter_chips(frame, chunks[1], &app.active_filters());

  let loading = app.is_loading();
  let (page, table_state) = app.table_parts();
  views::draw_report_table(frame, chunks[2], page, table_state, loading);

  renderfns::draw_footer(frame, chunks[3], app.current_notice());

  if let Some(stats) = app.stats_popup() {
    views::draw_stats(frame, chunks[2], stats);
  }

  // Overlays render last so they sit on top
  app.search().render_overlay(frame, chunks[2]);
  if app.command().is_active() {
    app
      .command()
      .render_overlay(frame, chunks[2], &app.filter_options());
  }
}
