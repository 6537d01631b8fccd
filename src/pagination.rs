//! Page windows and page metadata.

use serde::Serialize;

use crate::filter::FilterCriteria;
use crate::report::Report;

/// One displayed page of reports.
///
/// An empty result is page 1 of 1 with no neighbours.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
  pub reports: Vec<Report>,
  pub total: u64,
  pub page: u32,
  pub total_pages: u32,
  pub has_prev: bool,
  pub has_next: bool,
}

impl PageResult {
  /// Build a page, deriving the neighbour flags from `page` and `total_pages`.
  pub fn new(reports: Vec<Report>, total: u64, page: u32, total_pages: u32) -> Self {
    let page = page.max(1);
    let total_pages = total_pages.max(1);
    Self {
      reports,
      total,
      page,
      total_pages,
      has_prev: page > 1,
      has_next: page < total_pages,
    }
  }

  pub fn empty() -> Self {
    Self::new(Vec::new(), 0, 1, 1)
  }

  /// Present `reports` as the only page.
  pub fn single(reports: Vec<Report>) -> Self {
    let total = reports.len() as u64;
    Self::new(reports, total, 1, 1)
  }

  pub fn is_empty(&self) -> bool {
    self.reports.is_empty()
  }
}

impl Default for PageResult {
  fn default() -> Self {
    Self::empty()
  }
}

/// `ceil(total / page_size)`, but never less than 1.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
  let page_size = u64::from(page_size.max(1));
  let pages = total.div_ceil(page_size).max(1);
  u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Cut page `page` out of a full collection. The page is clamped into range.
pub fn window(items: Vec<Report>, page: u32, page_size: u32) -> PageResult {
  let page_size = page_size.max(1);
  let total = items.len() as u64;
  let pages = total_pages(total, page_size);
  let page = page.clamp(1, pages);

  let start = (page as usize - 1) * page_size as usize;
  let reports = items
    .into_iter()
    .skip(start)
    .take(page_size as usize)
    .collect();

  PageResult::new(reports, total, page, pages)
}

/// How a query is paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
  /// Ask the service for one page and pass its metadata through.
  ServerPaginated { page: u32, limit: u32 },
  /// Fetch the whole collection once, filter and sort locally, show one page.
  ClientFiltered,
}

impl PaginationStrategy {
  /// Client-side paging whenever a filter or a non-default sort is active.
  pub fn select(criteria: &FilterCriteria, page: u32, limit: u32) -> Self {
    if criteria.needs_client_pass() {
      PaginationStrategy::ClientFiltered
    } else {
      PaginationStrategy::ServerPaginated {
        page: page.max(1),
        limit: limit.max(1),
      }
    }
  }

  pub fn is_client_filtered(&self) -> bool {
    matches!(self, PaginationStrategy::ClientFiltered)
  }
}
