//! The in-memory "all reports" collection.

use crate::report::Report;

/// Full report collection held for client-side filtering.
///
/// Has no time-to-live; only a fetch may replace it and only invalidation may
/// drop it. Elements are never edited in place.
#[derive(Debug, Clone, Default)]
pub struct ReportCollection {
  reports: Option<Vec<Report>>,
}

impl ReportCollection {
  pub fn new() -> Self {
    Self::default()
  }

  /// The loaded records, or `None` when the next query must fetch.
  pub fn get(&self) -> Option<&[Report]> {
    self.reports.as_deref()
  }

  pub fn is_loaded(&self) -> bool {
    self.reports.is_some()
  }

  pub fn len(&self) -> usize {
    self.reports.as_ref().map_or(0, Vec::len)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Replace the whole collection with a freshly fetched one.
  pub fn replace(&mut self, reports: Vec<Report>) {
    self.reports = Some(reports);
  }

  /// Drop the collection. Returns whether anything was loaded.
  pub fn invalidate(&mut self) -> bool {
    self.reports.take().is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_replace_and_invalidate() {
    let mut collection = ReportCollection::new();
    assert!(!collection.is_loaded());
    assert!(collection.get().is_none());

    let report = Report::from_value(json!({"id": 1})).unwrap();
    collection.replace(vec![report]);
    assert!(collection.is_loaded());
    assert_eq!(collection.len(), 1);

    assert!(collection.invalidate());
    assert!(collection.get().is_none());
    assert!(!collection.invalidate());
  }

  #[test]
  fn test_loaded_empty_collection_is_not_absent() {
    let mut collection = ReportCollection::new();
    collection.replace(Vec::new());
    assert!(collection.is_loaded());
    assert!(collection.is_empty());
    assert_eq!(collection.get(), Some(&[][..]));
  }
}
