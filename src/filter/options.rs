//! Distinct values offered by the filter pickers.

use std::collections::BTreeSet;

use crate::report::{fields, Report};

/// Sorted, de-duplicated picker values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
  pub projects: Vec<String>,
  pub portfolios: Vec<String>,
  pub testers: Vec<String>,
  pub statuses: Vec<String>,
  pub sprints: Vec<String>,
}

impl FilterOptions {
  /// Collect option values from `records`.
  pub fn from_reports<'a, I>(records: I) -> Self
  where
    I: IntoIterator<Item = &'a Report>,
  {
    let mut projects = BTreeSet::new();
    let mut portfolios = BTreeSet::new();
    let mut testers = BTreeSet::new();
    let mut statuses = BTreeSet::new();
    let mut sprints = BTreeSet::new();

    for report in records {
      projects.extend(fields::project(report));
      portfolios.extend(fields::portfolio(report));
      statuses.extend(fields::status(report));
      sprints.extend(fields::sprint(report).map(|s| s.trim().to_string()));
      testers.extend(fields::testers(report));
    }

    let mut sprints: Vec<String> = sprints.into_iter().collect();
    // Numeric sprints in numeric order, anything else after them
    sprints.sort_by_key(|s| s.parse::<i64>().map_err(|_| s.clone()));

    Self {
      projects: projects.into_iter().collect(),
      portfolios: portfolios.into_iter().collect(),
      testers: testers.into_iter().collect(),
      statuses: statuses.into_iter().collect(),
      sprints,
    }
  }

  /// Use `fallback` testers when no record named any.
  pub fn with_fallback_testers<I>(mut self, fallback: I) -> Self
  where
    I: IntoIterator<Item = String>,
  {
    if self.testers.is_empty() {
      let names: BTreeSet<String> = fallback
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
      self.testers = names.into_iter().collect();
    }
    self
  }
}
