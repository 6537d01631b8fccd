//! The live filter criteria and everything derived from them.

use chrono::{Datelike, Months, NaiveDate, TimeDelta};
use std::fmt;
use std::str::FromStr;

/// Field a report list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
  #[default]
  Date,
  Title,
  Project,
  Sprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

/// Sort key, written `field-direction` (e.g. `date-desc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
  pub field: SortField,
  pub direction: SortDirection,
}

impl SortSpec {
  pub const fn new(field: SortField, direction: SortDirection) -> Self {
    Self { field, direction }
  }

  /// Parse a composite key, falling back to `date-desc` when it is not one.
  pub fn parse_or_default(raw: &str) -> Self {
    raw.parse().unwrap_or_default()
  }

  pub fn is_default(&self) -> bool {
    *self == Self::default()
  }
}

impl FromStr for SortSpec {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (field, direction) = s
      .trim()
      .split_once('-')
      .ok_or_else(|| format!("invalid sort key '{}'", s))?;

    let field = match field.to_lowercase().as_str() {
      "date" => SortField::Date,
      "title" => SortField::Title,
      "project" => SortField::Project,
      "sprint" => SortField::Sprint,
      other => return Err(format!("unknown sort field '{}'", other)),
    };
    let direction = match direction.to_lowercase().as_str() {
      "asc" => SortDirection::Asc,
      "desc" => SortDirection::Desc,
      other => return Err(format!("unknown sort direction '{}'", other)),
    };

    Ok(Self { field, direction })
  }
}

impl fmt::Display for SortSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let field = match self.field {
      SortField::Date => "date",
      SortField::Title => "title",
      SortField::Project => "project",
      SortField::Sprint => "sprint",
    };
    let direction = match self.direction {
      SortDirection::Asc => "asc",
      SortDirection::Desc => "desc",
    };
    write!(f, "{}-{}", field, direction)
  }
}

/// Name of a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
  Search,
  Project,
  Portfolio,
  Tester,
  Status,
  DateFrom,
  DateTo,
  Sprint,
  Sort,
}

impl FilterKey {
  /// Every criterion except `sort`, in display order.
  pub const FILTERS: [FilterKey; 8] = [
    FilterKey::Search,
    FilterKey::Project,
    FilterKey::Portfolio,
    FilterKey::Tester,
    FilterKey::Status,
    FilterKey::DateFrom,
    FilterKey::DateTo,
    FilterKey::Sprint,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      FilterKey::Search => "search",
      FilterKey::Project => "project",
      FilterKey::Portfolio => "portfolio",
      FilterKey::Tester => "tester",
      FilterKey::Status => "status",
      FilterKey::DateFrom => "dateFrom",
      FilterKey::DateTo => "dateTo",
      FilterKey::Sprint => "sprint",
      FilterKey::Sort => "sort",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      FilterKey::Search => "Search",
      FilterKey::Project => "Project",
      FilterKey::Portfolio => "Portfolio",
      FilterKey::Tester => "Tester",
      FilterKey::Status => "Status",
      FilterKey::DateFrom => "From Date",
      FilterKey::DateTo => "To Date",
      FilterKey::Sprint => "Sprint",
      FilterKey::Sort => "Sort",
    }
  }
}

impl FromStr for FilterKey {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "search" => Ok(FilterKey::Search),
      "project" => Ok(FilterKey::Project),
      "portfolio" => Ok(FilterKey::Portfolio),
      "tester" => Ok(FilterKey::Tester),
      "status" => Ok(FilterKey::Status),
      "dateFrom" | "from" => Ok(FilterKey::DateFrom),
      "dateTo" | "to" => Ok(FilterKey::DateTo),
      "sprint" => Ok(FilterKey::Sprint),
      "sort" => Ok(FilterKey::Sort),
      other => Err(format!("unknown filter '{}'", other)),
    }
  }
}

/// A removable chip describing one active criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilter {
  pub key: FilterKey,
  pub label: &'static str,
  pub value: String,
}

/// Preset criteria behind the quick-filter buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFilter {
  Today,
  Week,
  Month,
  Failed,
  Recent,
}

impl FromStr for QuickFilter {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "today" => Ok(QuickFilter::Today),
      "week" => Ok(QuickFilter::Week),
      "month" => Ok(QuickFilter::Month),
      "failed" => Ok(QuickFilter::Failed),
      "recent" => Ok(QuickFilter::Recent),
      other => Err(format!("unknown quick filter '{}'", other)),
    }
  }
}

/// Current filter values. Blank values mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
  pub search: String,
  pub project: String,
  pub portfolio: String,
  pub tester: String,
  pub status: String,
  pub date_from: String,
  pub date_to: String,
  pub sprint: String,
  pub sort: SortSpec,
}

impl FilterCriteria {
  /// Text value of a criterion; `sort` renders its composite key.
  pub fn value(&self, key: FilterKey) -> String {
    match key {
      FilterKey::Sort => self.sort.to_string(),
      other => self.text(other).to_string(),
    }
  }

  fn text(&self, key: FilterKey) -> &str {
    match key {
      FilterKey::Search => &self.search,
      FilterKey::Project => &self.project,
      FilterKey::Portfolio => &self.portfolio,
      FilterKey::Tester => &self.tester,
      FilterKey::Status => &self.status,
      FilterKey::DateFrom => &self.date_from,
      FilterKey::DateTo => &self.date_to,
      FilterKey::Sprint => &self.sprint,
      FilterKey::Sort => "",
    }
  }

  fn text_mut(&mut self, key: FilterKey) -> Option<&mut String> {
    match key {
      FilterKey::Search => Some(&mut self.search),
      FilterKey::Project => Some(&mut self.project),
      FilterKey::Portfolio => Some(&mut self.portfolio),
      FilterKey::Tester => Some(&mut self.tester),
      FilterKey::Status => Some(&mut self.status),
      FilterKey::DateFrom => Some(&mut self.date_from),
      FilterKey::DateTo => Some(&mut self.date_to),
      FilterKey::Sprint => Some(&mut self.sprint),
      FilterKey::Sort => None,
    }
  }

  /// Set one criterion. Unknown sort keys fall back to the default order.
  pub fn set(&mut self, key: FilterKey, value: &str) {
    match self.text_mut(key) {
      Some(slot) => *slot = value.to_string(),
      None => self.sort = SortSpec::parse_or_default(value),
    }
  }

  /// Blank one criterion. Removing `sort` restores the default order.
  pub fn remove(&mut self, key: FilterKey) {
    match self.text_mut(key) {
      Some(slot) => slot.clear(),
      None => self.sort = SortSpec::default(),
    }
  }

  /// Reset every criterion to its default.
  pub fn clear_all(&mut self) {
    *self = Self::default();
  }

  /// Whether any non-sort criterion constrains the result.
  pub fn has_filters(&self) -> bool {
    FilterKey::FILTERS
      .iter()
      .any(|key| !self.text(*key).trim().is_empty())
  }

  /// Whether results must be computed locally instead of paged by the server.
  pub fn needs_client_pass(&self) -> bool {
    self.has_filters() || !self.sort.is_default()
  }

  /// Chips for every non-blank criterion except `sort`.
  pub fn active_summary(&self) -> Vec<ActiveFilter> {
    FilterKey::FILTERS
      .iter()
      .filter(|key| !self.text(**key).trim().is_empty())
      .map(|key| ActiveFilter {
        key: *key,
        label: key.label(),
        value: self.text(*key).to_string(),
      })
      .collect()
  }

  /// Replace the criteria with a preset, keeping only the search text.
  pub fn apply_quick_filter(&mut self, quick: QuickFilter, today: NaiveDate) {
    let search = std::mem::take(&mut self.search);
    self.clear_all();
    self.search = search;

    let (from, to) = match quick {
      QuickFilter::Today => (Some(today), Some(today)),
      QuickFilter::Week => {
        let start = today - TimeDelta::days(i64::from(today.weekday().num_days_from_sunday()));
        (Some(start), Some(start + TimeDelta::days(6)))
      }
      QuickFilter::Month => {
        let first = today.with_day(1).unwrap_or(today);
        let last = first
          .checked_add_months(Months::new(1))
          .and_then(|next| next.pred_opt())
          .unwrap_or(today);
        (Some(first), Some(last))
      }
      QuickFilter::Recent => (Some(today - TimeDelta::days(7)), Some(today)),
      QuickFilter::Failed => {
        self.status = "failed".to_string();
        (None, None)
      }
    };

    if let Some(from) = from {
      self.date_from = from.format("%Y-%m-%d").to_string();
    }
    if let Some(to) = to {
      self.date_to = to.format("%Y-%m-%d").to_string();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  #[test]
  fn test_sort_spec_parse_and_display() {
    let spec: SortSpec = "title-asc".parse().unwrap();
    assert_eq!(spec, SortSpec::new(SortField::Title, SortDirection::Asc));
    assert_eq!(spec.to_string(), "title-asc");
    assert_eq!(SortSpec::default().to_string(), "date-desc");
  }

  #[test]
  fn test_sort_spec_invalid_falls_back() {
    assert_eq!(SortSpec::parse_or_default("priority-asc"), SortSpec::default());
    assert_eq!(SortSpec::parse_or_default("date-sideways"), SortSpec::default());
    assert_eq!(SortSpec::parse_or_default(""), SortSpec::default());
  }

  #[test]
  fn test_blank_criteria_are_inactive() {
    let mut criteria = FilterCriteria::default();
    assert!(!criteria.has_filters());
    assert!(!criteria.needs_client_pass());

    criteria.set(FilterKey::Project, "   ");
    assert!(!criteria.has_filters());

    criteria.set(FilterKey::Sort, "sprint-asc");
    assert!(criteria.needs_client_pass());
    assert!(!criteria.has_filters());
  }

  #[test]
  fn test_active_summary_order_and_labels() {
    let mut criteria = FilterCriteria::default();
    criteria.set(FilterKey::Sprint, "4");
    criteria.set(FilterKey::Search, "login");
    criteria.set(FilterKey::DateFrom, "2024-01-01");
    criteria.set(FilterKey::Sort, "title-asc");

    let summary = criteria.active_summary();
    let keys: Vec<_> = summary.iter().map(|chip| chip.key).collect();
    assert_eq!(
      keys,
      vec![FilterKey::Search, FilterKey::DateFrom, FilterKey::Sprint]
    );
    assert_eq!(summary[1].label, "From Date");
    assert_eq!(summary[1].value, "2024-01-01");
  }

  #[test]
  fn test_remove_and_clear() {
    let mut criteria = FilterCriteria::default();
    criteria.set(FilterKey::Tester, "Bob");
    criteria.set(FilterKey::Status, "failed");
    criteria.set(FilterKey::Sort, "project-asc");

    criteria.remove(FilterKey::Tester);
    assert!(criteria.tester.is_empty());
    assert_eq!(criteria.status, "failed");

    criteria.remove(FilterKey::Sort);
    assert!(criteria.sort.is_default());

    criteria.clear_all();
    assert_eq!(criteria, FilterCriteria::default());
  }

  #[test]
  fn test_quick_filter_week_starts_on_sunday() {
    let mut criteria = FilterCriteria::default();
    // 2024-06-05 is a Wednesday
    criteria.apply_quick_filter(QuickFilter::Week, date("2024-06-05"));
    assert_eq!(criteria.date_from, "2024-06-02");
    assert_eq!(criteria.date_to, "2024-06-08");
  }

  #[test]
  fn test_quick_filter_month_and_recent() {
    let mut criteria = FilterCriteria::default();
    criteria.apply_quick_filter(QuickFilter::Month, date("2024-02-14"));
    assert_eq!(criteria.date_from, "2024-02-01");
    assert_eq!(criteria.date_to, "2024-02-29");

    criteria.apply_quick_filter(QuickFilter::Recent, date("2024-03-03"));
    assert_eq!(criteria.date_from, "2024-02-25");
    assert_eq!(criteria.date_to, "2024-03-03");
  }

  #[test]
  fn test_quick_filter_keeps_only_search() {
    let mut criteria = FilterCriteria::default();
    criteria.set(FilterKey::Search, "checkout");
    criteria.set(FilterKey::Project, "Alpha");
    criteria.set(FilterKey::Sort, "title-asc");

    criteria.apply_quick_filter(QuickFilter::Failed, date("2024-06-05"));
    assert_eq!(criteria.search, "checkout");
    assert_eq!(criteria.status, "failed");
    assert!(criteria.project.is_empty());
    assert!(criteria.date_from.is_empty());
    assert!(criteria.sort.is_default());
  }

  #[test]
  fn test_filter_key_round_trip_names() {
    for key in FilterKey::FILTERS {
      assert_eq!(key.as_str().parse::<FilterKey>().unwrap(), key);
    }
  }
}
