//! Conjunctive client-side filtering.

use chrono::{DateTime, NaiveDate, Utc};

use super::criteria::FilterCriteria;
use crate::report::{fields, Report};

/// Criteria prepared once per filter pass.
struct Compiled<'c> {
  search: Option<String>,
  project: Option<&'c str>,
  portfolio: Option<&'c str>,
  tester: Option<&'c str>,
  status: Option<&'c str>,
  sprint: Option<&'c str>,
  from: Option<DateTime<Utc>>,
  to: Option<DateTime<Utc>>,
}

fn non_blank(value: &str) -> Option<&str> {
  if value.trim().is_empty() {
    None
  } else {
    Some(value)
  }
}

fn criterion_day(value: &str) -> Option<NaiveDate> {
  let value = non_blank(value)?.trim();
  fields::parse_report_date(value).map(|dt| dt.date_naive())
}

impl<'c> Compiled<'c> {
  fn new(criteria: &'c FilterCriteria) -> Self {
    Self {
      search: non_blank(&criteria.search).map(str::to_lowercase),
      project: non_blank(&criteria.project),
      portfolio: non_blank(&criteria.portfolio),
      tester: non_blank(&criteria.tester).map(str::trim),
      status: non_blank(&criteria.status),
      sprint: non_blank(&criteria.sprint).map(str::trim),
      from: criterion_day(&criteria.date_from)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc()),
      to: criterion_day(&criteria.date_to)
        .and_then(|day| day.and_hms_milli_opt(23, 59, 59, 999))
        .map(|dt| dt.and_utc()),
    }
  }

  fn matches(&self, report: &Report) -> bool {
    if let Some(term) = &self.search {
      if !fields::search_text(report).contains(term.as_str()) {
        return false;
      }
    }

    if !exact(self.project, fields::project(report))
      || !exact(self.portfolio, fields::portfolio(report))
      || !exact(self.status, fields::status(report))
      || !exact(self.sprint, fields::sprint(report))
    {
      return false;
    }

    if let Some(tester) = self.tester {
      if !fields::testers(report).contains(tester) {
        return false;
      }
    }

    if self.from.is_some() || self.to.is_some() {
      // Records without a usable date are never excluded by a date range
      if let Some(date) = fields::report_date(report) {
        if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
          return false;
        }
      }
    }

    true
  }
}

/// Exact, case-sensitive match. A missing value never equals an active criterion.
fn exact(wanted: Option<&str>, actual: Option<String>) -> bool {
  match wanted {
    None => true,
    Some(wanted) => actual.as_deref() == Some(wanted),
  }
}

/// Reports satisfying every active criterion, in input order.
pub fn filter_reports<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<&'a Report>
where
  I: IntoIterator<Item = &'a Report>,
{
  let compiled = Compiled::new(criteria);
  records
    .into_iter()
    .filter(|report| compiled.matches(report))
    .collect()
}
