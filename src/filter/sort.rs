//! Ordering of filtered reports.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::criteria::{SortDirection, SortField, SortSpec};
use crate::report::{fields, Report};

/// Comparable value of one record for one sort field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
  Date(DateTime<Utc>),
  Text(String),
  Number(i64),
}

fn sort_value(report: &Report, field: SortField) -> Option<SortValue> {
  match field {
    // Undated records sort as the epoch rather than being excluded
    SortField::Date => Some(SortValue::Date(
      fields::report_date(report).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    )),
    SortField::Title => Some(SortValue::Text(
      fields::title(report).unwrap_or_default().to_lowercase(),
    )),
    SortField::Project => fields::project(report).map(|p| SortValue::Text(p.to_lowercase())),
    SortField::Sprint => Some(SortValue::Number(
      fields::sprint(report).map_or(0, |s| leading_integer(&s)),
    )),
  }
}

/// Integer at the start of `raw` ("12b" is 12, "3.5" is 3). 0 when there is none.
fn leading_integer(raw: &str) -> i64 {
  let raw = raw.trim_start();
  let (sign, rest) = match raw.strip_prefix('-') {
    Some(rest) => (-1, rest),
    None => (1, raw.strip_prefix('+').unwrap_or(raw)),
  };
  let end = rest
    .find(|c: char| !c.is_ascii_digit())
    .unwrap_or(rest.len());
  rest[..end].parse::<i64>().map_or(0, |n| sign * n)
}

/// Missing values order before any present value; direction flips the result.
fn compare(a: &Option<SortValue>, b: &Option<SortValue>, direction: SortDirection) -> Ordering {
  let ordering = match (a, b) {
    (None, None) => Ordering::Equal,
    (None, Some(_)) => Ordering::Less,
    (Some(_), None) => Ordering::Greater,
    (Some(a), Some(b)) => a.cmp(b),
  };

  match direction {
    SortDirection::Asc => ordering,
    SortDirection::Desc => ordering.reverse(),
  }
}

/// Return the records in `spec` order. The sort is stable; ties keep input order.
pub fn sort_reports<'a>(records: Vec<&'a Report>, spec: SortSpec) -> Vec<&'a Report> {
  let mut keyed: Vec<(Option<SortValue>, &'a Report)> = records
    .into_iter()
    .map(|report| (sort_value(report, spec.field), report))
    .collect();

  keyed.sort_by(|(a, _), (b, _)| compare(a, b, spec.direction));
  keyed.into_iter().map(|(_, report)| report).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn reports(values: Vec<serde_json::Value>) -> Vec<Report> {
    values.into_iter().filter_map(Report::from_value).collect()
  }

  fn ids(sorted: &[&Report]) -> Vec<String> {
    sorted.iter().filter_map(|r| r.id()).collect()
  }

  fn spec(raw: &str) -> SortSpec {
    raw.parse().unwrap()
  }

  #[test]
  fn test_sort_by_title_case_insensitive() {
    let data = reports(vec![
      json!({"id": "b", "title": "beta"}),
      json!({"id": "a", "title": "Alpha"}),
      json!({"id": "c", "reportName": "Charlie"}),
    ]);
    let sorted = sort_reports(data.iter().collect(), spec("title-asc"));
    assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
  }

  #[test]
  fn test_sort_by_sprint_numeric() {
    let data = reports(vec![
      json!({"id": "ten", "sprint": "10"}),
      json!({"id": "two", "sprintNumber": 2}),
      json!({"id": "none", "sprint": "n/a"}),
    ]);
    let sorted = sort_reports(data.iter().collect(), spec("sprint-asc"));
    assert_eq!(ids(&sorted), vec!["none", "two", "ten"]);
  }

  #[test]
  fn test_sprint_sorts_by_leading_number() {
    let data = reports(vec![
      json!({"id": "four", "sprint": "4"}),
      json!({"id": "three-a", "sprint": "3a"}),
      json!({"id": "twelve", "sprint": " 12 (hotfix)"}),
    ]);
    let sorted = sort_reports(data.iter().collect(), spec("sprint-asc"));
    assert_eq!(ids(&sorted), vec!["three-a", "four", "twelve"]);

    assert_eq!(leading_integer("3.5"), 3);
    assert_eq!(leading_integer("-2x"), -2);
    assert_eq!(leading_integer("n/a"), 0);
  }

  #[test]
  fn test_unparsable_date_sorts_earliest() {
    let data = reports(vec![
      json!({"id": "new", "date": "2024-06-02"}),
      json!({"id": "bad", "date": "not-a-date"}),
      json!({"id": "old", "date": "01-06-2024"}),
    ]);

    let asc = sort_reports(data.iter().collect(), spec("date-asc"));
    assert_eq!(ids(&asc), vec!["bad", "old", "new"]);

    let desc = sort_reports(data.iter().collect(), spec("date-desc"));
    assert_eq!(ids(&desc), vec!["new", "old", "bad"]);
  }

  #[test]
  fn test_missing_project_sorts_first_ascending() {
    let data = reports(vec![
      json!({"id": "z", "project": "zeta"}),
      json!({"id": "missing"}),
      json!({"id": "a", "projectName": "Alpha"}),
    ]);
    let asc = sort_reports(data.iter().collect(), spec("project-asc"));
    assert_eq!(ids(&asc), vec!["missing", "a", "z"]);

    let desc = sort_reports(data.iter().collect(), spec("project-desc"));
    assert_eq!(ids(&desc), vec!["z", "a", "missing"]);
  }

  #[test]
  fn test_ascending_reversed_equals_descending() {
    let data = reports(vec![
      json!({"id": "1", "title": "d", "project": "p4", "sprint": 4, "date": "2024-01-04"}),
      json!({"id": "2", "title": "a", "project": "p1", "sprint": 1, "date": "2024-01-01"}),
      json!({"id": "3", "title": "c", "project": "p3", "sprint": 3, "date": "2024-01-03"}),
      json!({"id": "4", "title": "b", "project": "p2", "sprint": 2, "date": "2024-01-02"}),
    ]);

    for field in ["date", "title", "project", "sprint"] {
      let mut asc = sort_reports(data.iter().collect(), spec(&format!("{}-asc", field)));
      asc.reverse();
      let desc = sort_reports(data.iter().collect(), spec(&format!("{}-desc", field)));
      assert_eq!(ids(&asc), ids(&desc), "field {}", field);
    }
  }

  #[test]
  fn test_sort_is_stable_for_ties() {
    let data = reports(vec![
      json!({"id": "first", "project": "Same"}),
      json!({"id": "second", "project": "same"}),
    ]);
    let sorted = sort_reports(data.iter().collect(), spec("project-desc"));
    assert_eq!(ids(&sorted), vec!["first", "second"]);
  }

  #[test]
  fn test_sort_leaves_input_untouched() {
    let data = reports(vec![json!({"id": "b", "title": "b"}), json!({"id": "a", "title": "a"})]);
    let original: Vec<&Report> = data.iter().collect();
    let _ = sort_reports(original.clone(), spec("title-asc"));
    assert_eq!(ids(&original), vec!["b", "a"]);
  }
}
