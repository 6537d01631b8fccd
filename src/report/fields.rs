//! Canonical field resolution for loosely-shaped report records.
//!
//! Each logical field has an ordered list of [`Source`]s. Resolution walks the
//! list and takes the first source that yields a non-empty value. Resolution
//! never modifies the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;

use super::record::{scalar_text, Report};

/// One way a logical value can be stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  /// A string or number field.
  Scalar(&'static str),
  /// An array of plain names or of objects exposing `name`.
  NameList(&'static str),
  /// A string holding a JSON-encoded name list.
  JsonNameList(&'static str),
  /// A comma-separated string of names that is not valid JSON.
  CommaList(&'static str),
}

pub const PROJECT: &[Source] = &[Source::Scalar("project"), Source::Scalar("projectName")];

pub const PORTFOLIO: &[Source] = &[
  Source::Scalar("portfolio"),
  Source::Scalar("portfolioName"),
];

pub const STATUS: &[Source] = &[Source::Scalar("status"), Source::Scalar("testingStatus")];

pub const SPRINT: &[Source] = &[Source::Scalar("sprint"), Source::Scalar("sprintNumber")];

pub const TITLE: &[Source] = &[Source::Scalar("title"), Source::Scalar("reportName")];

pub const DATE: &[Source] = &[
  Source::Scalar("date"),
  Source::Scalar("reportDate"),
  Source::Scalar("createdAt"),
  Source::Scalar("created_at"),
  Source::Scalar("dateCreated"),
];

/// Collection sources come first; single-value fields only when no collection
/// produced a name.
pub const TESTERS: &[Source] = &[
  Source::NameList("testers"),
  Source::NameList("testerData"),
  Source::NameList("tester_data"),
  Source::JsonNameList("testers"),
  Source::CommaList("testers"),
  Source::Scalar("tester"),
  Source::Scalar("testerName"),
  Source::Scalar("assignedTester"),
];

/// Raw fields that take part in free-text search.
pub const SEARCHABLE: &[&str] = &[
  "title",
  "project",
  "portfolio",
  "reportName",
  "projectName",
  "portfolioName",
];

impl Source {
  /// Values this source yields for `report`, possibly none.
  pub fn extract(&self, report: &Report) -> Vec<String> {
    match *self {
      Source::Scalar(key) => report.text(key).into_iter().collect(),
      Source::NameList(key) => match report.get(key) {
        Some(Value::Array(items)) => names_from_array(items),
        _ => Vec::new(),
      },
      Source::JsonNameList(key) => match report.get(key) {
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
          Ok(Value::Array(items)) => names_from_array(&items),
          _ => Vec::new(),
        },
        _ => Vec::new(),
      },
      Source::CommaList(key) => match report.get(key) {
        Some(Value::String(raw)) if serde_json::from_str::<Value>(raw).is_err() => raw
          .split(',')
          .map(str::trim)
          .filter(|name| !name.is_empty())
          .map(String::from)
          .collect(),
        _ => Vec::new(),
      },
    }
  }
}

fn names_from_array(items: &[Value]) -> Vec<String> {
  items
    .iter()
    .filter_map(|item| match item {
      Value::Object(obj) => obj.get("name").and_then(scalar_text),
      other => scalar_text(other),
    })
    .collect()
}

/// Values from the first source in `sources` that yields any.
pub fn resolve(report: &Report, sources: &[Source]) -> Vec<String> {
  sources
    .iter()
    .map(|source| source.extract(report))
    .find(|values| !values.is_empty())
    .unwrap_or_default()
}

fn resolve_one(report: &Report, sources: &[Source]) -> Option<String> {
  resolve(report, sources).into_iter().next()
}

pub fn project(report: &Report) -> Option<String> {
  resolve_one(report, PROJECT)
}

pub fn portfolio(report: &Report) -> Option<String> {
  resolve_one(report, PORTFOLIO)
}

pub fn status(report: &Report) -> Option<String> {
  resolve_one(report, STATUS)
}

/// Sprint as text, so `3` and `"3"` compare equal.
pub fn sprint(report: &Report) -> Option<String> {
  resolve_one(report, SPRINT)
}

pub fn title(report: &Report) -> Option<String> {
  resolve_one(report, TITLE)
}

/// Trimmed tester names. Duplicates collapse.
pub fn testers(report: &Report) -> BTreeSet<String> {
  resolve(report, TESTERS)
    .into_iter()
    .map(|name| name.trim().to_string())
    .filter(|name| !name.is_empty())
    .collect()
}

/// Best-effort report date.
///
/// Only the first non-empty date candidate is considered. `None` means the
/// record carries no usable date.
pub fn report_date(report: &Report) -> Option<DateTime<Utc>> {
  let value = DATE.iter().find_map(|source| match *source {
    Source::Scalar(key) => report
      .get(key)
      .filter(|value| scalar_text(value).is_some()),
    _ => None,
  })?;

  match value {
    Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
    Value::String(raw) => parse_report_date(raw),
    _ => None,
  }
}

/// Parse a date the way report producers have written them.
///
/// ISO forms are tried first, then `DD-MM-YYYY`.
pub fn parse_report_date(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  parse_iso(raw).or_else(|| parse_day_first(raw))
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }

  for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
      return Some(dt.and_utc());
    }
  }

  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}

fn parse_day_first(raw: &str) -> Option<DateTime<Utc>> {
  let parts: Vec<&str> = raw.split('-').collect();
  let [day, month, year] = parts.as_slice() else {
    return None;
  };
  if day.len() != 2 || month.len() != 2 || year.len() != 4 {
    return None;
  }

  let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
  date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// Lowercased text that free-text search matches against.
pub fn search_text(report: &Report) -> String {
  SEARCHABLE
    .iter()
    .filter_map(|key| report.text(key))
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use serde_json::json;

  fn report(value: Value) -> Report {
    Report::from_value(value).unwrap()
  }

  #[test]
  fn test_project_prefers_project_over_project_name() {
    let both = report(json!({"project": "Alpha", "projectName": "Beta"}));
    let alternate = report(json!({"project": "", "projectName": "Beta"}));
    let neither = report(json!({"title": "x"}));

    assert_eq!(project(&both).as_deref(), Some("Alpha"));
    assert_eq!(project(&alternate).as_deref(), Some("Beta"));
    assert_eq!(project(&neither), None);
  }

  #[test]
  fn test_status_and_portfolio_alternates() {
    let r = report(json!({"testingStatus": "failed", "portfolioName": "Core"}));
    assert_eq!(status(&r).as_deref(), Some("failed"));
    assert_eq!(portfolio(&r).as_deref(), Some("Core"));
  }

  #[test]
  fn test_sprint_numeric_and_text_agree() {
    let numeric = report(json!({"sprint": 3}));
    let text = report(json!({"sprintNumber": "3"}));
    assert_eq!(sprint(&numeric), sprint(&text));
  }

  #[test]
  fn test_tester_shapes_resolve_to_same_name() {
    let shapes = [
      json!({"testers": ["Alice"]}),
      json!({"testers": [{"name": "Alice"}]}),
      json!({"testers": "[\"Alice\"]"}),
      json!({"testers": "Alice, Bob"}),
      json!({"testerData": [{"name": " Alice "}]}),
      json!({"tester_data": [{"name": "Alice"}]}),
      json!({"assignedTester": "Alice"}),
    ];

    for shape in shapes {
      let names = testers(&report(shape.clone()));
      assert!(names.contains("Alice"), "no Alice in {shape}: {names:?}");
    }
  }

  #[test]
  fn test_json_string_of_objects() {
    let r = report(json!({"testers": "[{\"name\": \"Dana\"}, {\"name\": \"Eve\"}]"}));
    let names: Vec<_> = testers(&r).into_iter().collect();
    assert_eq!(names, vec!["Dana", "Eve"]);
  }

  #[test]
  fn test_single_tester_used_only_without_collection() {
    let r = report(json!({"testers": ["Bob"], "tester": "Carol"}));
    let names: Vec<_> = testers(&r).into_iter().collect();
    assert_eq!(names, vec!["Bob"]);

    let empty_list = report(json!({"testers": [], "tester": "Carol"}));
    assert!(testers(&empty_list).contains("Carol"));
  }

  #[test]
  fn test_duplicate_testers_collapse() {
    let r = report(json!({"testers": "Bob, Bob ,Alice"}));
    assert_eq!(testers(&r).len(), 2);
  }

  #[test]
  fn test_date_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(parse_report_date("2024-06-01"), Some(expected));
    assert_eq!(parse_report_date("01-06-2024"), Some(expected));
    assert_eq!(parse_report_date("2024-06-01T00:00:00Z"), Some(expected));
    assert_eq!(parse_report_date("2024-06-01T00:00:00"), Some(expected));
    assert_eq!(
      parse_report_date("2024-06-01 12:30:00"),
      Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap())
    );
    assert_eq!(parse_report_date("not-a-date"), None);
    assert_eq!(parse_report_date("31-02-2024"), None);
  }

  #[test]
  fn test_report_date_uses_first_non_empty_candidate() {
    let r = report(json!({"date": "", "reportDate": "02-06-2024", "createdAt": "2020-01-01"}));
    assert_eq!(
      report_date(&r),
      Some(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap())
    );

    let unparsable_first = report(json!({"date": "soon", "createdAt": "2020-01-01"}));
    assert_eq!(report_date(&unparsable_first), None);

    let created = report(json!({"created_at": "2023-03-04T05:06:07Z"}));
    assert!(report_date(&created).is_some());
  }

  #[test]
  fn test_search_text_joins_present_fields() {
    let r = report(json!({"title": "Sprint 1", "projectName": "Alpha", "portfolio": "Core"}));
    assert_eq!(search_text(&r), "sprint 1 core alpha");
  }

  #[test]
  fn test_resolution_does_not_modify_record() {
    let r = report(json!({"testers": "Alice, Bob"}));
    let before = r.clone();
    let _ = testers(&r);
    let _ = report_date(&r);
    assert_eq!(r, before);
  }
}
