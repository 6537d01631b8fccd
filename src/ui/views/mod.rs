mod reports;
mod stats;

pub use reports::draw_report_table;
pub use stats::draw_stats;
