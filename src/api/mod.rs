//! Client side of the report service.

mod client;
mod error;
mod types;

pub use client::{HttpReportApi, ReportApi, DEFAULT_REPORTS_PATH};
pub use error::ApiError;
pub use types::{
  decode_report_page, DashboardStats, FormData, NamedEntity, ProjectEntity, ReportsQuery,
  OVERALL_COUNTERS,
};
