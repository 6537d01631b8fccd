//! Client-side filtering, sorting and filter option extraction.

pub mod criteria;
pub mod engine;
pub mod options;
pub mod sort;

pub use criteria::{
  ActiveFilter, FilterCriteria, FilterKey, QuickFilter, SortDirection, SortField, SortSpec,
};
pub use engine::filter_reports;
pub use options::FilterOptions;
pub use sort::sort_reports;
