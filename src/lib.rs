//! Report query subsystem for a QA test-report service.
//!
//! Fetches report records from the remote service, caches them, reconciles
//! their inconsistent shapes and filters, sorts and paginates them locally.

pub mod api;
pub mod cache;
pub mod config;
pub mod facade;
pub mod filter;
pub mod logging;
pub mod pagination;
pub mod report;
pub mod search;

pub use facade::{
  FetchKind, FetchOutcome, FetchRequest, Notice, NoticeLevel, QueryPlan, QuerySessionState,
  QuerySettings, ReportQuery,
};
pub use filter::{FilterCriteria, FilterKey, SortSpec};
pub use pagination::PageResult;
pub use report::Report;
