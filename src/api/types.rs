//! Wire types for the report service and normalization of its responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::pagination::{self, PageResult};
use crate::report::Report;

/// Parameters of one report list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportsQuery {
  pub page: u32,
  pub limit: u32,
  pub search: Option<String>,
  /// The caller wants every record; a bare array is returned unwindowed.
  pub whole_collection: bool,
}

impl ReportsQuery {
  pub fn new(page: u32, limit: u32) -> Self {
    Self {
      page: page.max(1),
      limit: limit.max(1),
      search: None,
      whole_collection: false,
    }
  }

  /// First page of `limit` records, asking for the whole collection.
  pub fn whole_collection(limit: u32) -> Self {
    Self {
      whole_collection: true,
      ..Self::new(1, limit)
    }
  }

  /// Attach a search term. Blank terms are not sent.
  pub fn with_search(mut self, search: &str) -> Self {
    let search = search.trim();
    self.search = (!search.is_empty()).then(|| search.to_string());
    self
  }

  /// Query-string pairs. `per_page` mirrors `limit` for servers that read it.
  pub fn params(&self) -> Vec<(&'static str, String)> {
    let mut params = vec![
      ("page", self.page.to_string()),
      ("limit", self.limit.to_string()),
      ("per_page", self.limit.to_string()),
    ];
    if let Some(search) = &self.search {
      params.push(("search", search.clone()));
    }
    params
  }
}

fn decode_reports(items: Vec<Value>) -> Vec<Report> {
  items.into_iter().filter_map(Report::from_value).collect()
}

fn number(envelope: &Map<String, Value>, key: &str) -> Option<u64> {
  let value = envelope.get(key)?;
  value
    .as_u64()
    .or_else(|| value.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_page(n: u64) -> u32 {
  u32::try_from(n).unwrap_or(u32::MAX)
}

/// Normalize a report list response.
///
/// A bare array is the whole collection. It is windowed to the requested page
/// unless the query asks for the whole collection. An envelope must
/// carry a `reports` array; missing metadata is derived from what is present.
/// Null and non-object entries are dropped.
pub fn decode_report_page(body: Value, query: &ReportsQuery) -> Result<PageResult, ApiError> {
  match body {
    Value::Array(items) if query.whole_collection => Ok(PageResult::single(decode_reports(items))),
    Value::Array(items) => Ok(pagination::window(
      decode_reports(items),
      query.page,
      query.limit,
    )),
    Value::Object(mut envelope) => {
      let items = match envelope.remove("reports") {
        Some(Value::Array(items)) => items,
        Some(other) => {
          return Err(ApiError::ShapeMismatch(format!(
            "`reports` is not an array: {}",
            kind(&other)
          )))
        }
        None => {
          return Err(ApiError::ShapeMismatch(
            "object response without `reports`".to_string(),
          ))
        }
      };
      let reports = decode_reports(items);

      let total = number(&envelope, "total").unwrap_or(reports.len() as u64);
      let page = number(&envelope, "page").map_or(query.page, as_page).max(1);
      let total_pages = number(&envelope, "totalPages")
        .map(as_page)
        .unwrap_or_else(|| pagination::total_pages(total, query.limit))
        .max(1);

      let mut result = PageResult::new(reports, total, page, total_pages);
      if let Some(has_prev) = envelope.get("hasPrev").and_then(Value::as_bool) {
        result.has_prev = has_prev;
      }
      if let Some(has_next) = envelope.get("hasNext").and_then(Value::as_bool) {
        result.has_next = has_next;
      }
      Ok(result)
    }
    other => Err(ApiError::ShapeMismatch(format!(
      "expected an array or an object, got {}",
      kind(&other)
    ))),
  }
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

/// Counter names of the dashboard's `overall` section.
pub const OVERALL_COUNTERS: [&str; 10] = [
  "totalReports",
  "completedReports",
  "inProgressReports",
  "pendingReports",
  "totalUserStories",
  "totalTestCases",
  "totalIssues",
  "totalEnhancements",
  "automationTotalTestCases",
  "automationPassedTestCases",
];

/// Aggregated metrics computed by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
  pub overall: Map<String, Value>,
  #[serde(default)]
  pub projects: Vec<Value>,
}

impl DashboardStats {
  /// All counters at zero and no per-project rows.
  pub fn zeroed() -> Self {
    let overall = OVERALL_COUNTERS
      .iter()
      .map(|name| (name.to_string(), Value::from(0)))
      .collect();
    Self {
      overall,
      projects: Vec::new(),
    }
  }

  /// Value of an `overall` counter, 0 when absent or not a number.
  pub fn count(&self, name: &str) -> u64 {
    number(&self.overall, name).unwrap_or(0)
  }

  pub fn decode(body: Value) -> Result<Self, ApiError> {
    serde_json::from_value(body)
      .map_err(|e| ApiError::ShapeMismatch(format!("dashboard stats: {}", e)))
  }
}

/// A named entity from the dropdown data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamedEntity {
  #[serde(default)]
  pub id: Option<i64>,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectEntity {
  #[serde(default)]
  pub id: Option<i64>,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub portfolio_id: Option<i64>,
}

/// Values for the report form dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormData {
  #[serde(default)]
  pub portfolios: Vec<NamedEntity>,
  #[serde(default)]
  pub projects: Vec<ProjectEntity>,
  #[serde(default)]
  pub testers: Vec<NamedEntity>,
  #[serde(default)]
  pub team_members: Vec<NamedEntity>,
}

impl FormData {
  pub fn decode(body: Value) -> Result<Self, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::ShapeMismatch(format!("form data: {}", e)))
  }

  pub fn tester_names(&self) -> Vec<String> {
    self.testers.iter().map(|t| t.name.clone()).collect()
  }

  pub fn portfolio_id(&self, name: &str) -> Option<i64> {
    self
      .portfolios
      .iter()
      .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
      .and_then(|p| p.id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_query_params() {
    let query = ReportsQuery::new(2, 10).with_search("  alpha ");
    assert_eq!(
      query.params(),
      vec![
        ("page", "2".to_string()),
        ("limit", "10".to_string()),
        ("per_page", "10".to_string()),
        ("search", "alpha".to_string()),
      ]
    );

    let blank = ReportsQuery::new(0, 10).with_search("   ");
    assert_eq!(blank.page, 1);
    assert_eq!(blank.search, None);
  }

  #[test]
  fn test_bare_array_is_windowed() {
    let body = json!((0..25).map(|i| json!({ "id": i })).collect::<Vec<_>>());
    let page = decode_report_page(body, &ReportsQuery::new(3, 10)).unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 3);
    assert_eq!(page.reports.len(), 5);
    assert!(page.has_prev);
    assert!(!page.has_next);
  }

  #[test]
  fn test_bare_array_kept_whole_for_collection_query() {
    let body = json!((0..1500).map(|i| json!({ "id": i })).collect::<Vec<_>>());
    let query = ReportsQuery::whole_collection(1000);
    assert_eq!(query.params()[1], ("limit", "1000".to_string()));

    let page = decode_report_page(body, &query).unwrap();
    assert_eq!(page.total, 1500);
    assert_eq!(page.reports.len(), 1500);
    assert_eq!((page.page, page.total_pages), (1, 1));
  }

  #[test]
  fn test_empty_array_is_one_page() {
    let page = decode_report_page(json!([]), &ReportsQuery::new(1, 10)).unwrap();
    assert_eq!((page.total, page.page, page.total_pages), (0, 1, 1));
    assert!(!page.has_prev && !page.has_next);
  }

  #[test]
  fn test_envelope_passes_metadata_through() {
    let body = json!({
      "reports": [{"id": 11}, {"id": 12}],
      "total": 12,
      "page": 2,
      "totalPages": 2,
      "hasNext": false,
      "hasPrev": true
    });
    let page = decode_report_page(body, &ReportsQuery::new(2, 10)).unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.page, 2);
    assert_eq!(page.reports.len(), 2);
    assert!(page.has_prev);
    assert!(!page.has_next);
  }

  #[test]
  fn test_envelope_derives_missing_metadata() {
    let body = json!({ "reports": [{"id": 1}], "total": 25 });
    let page = decode_report_page(body, &ReportsQuery::new(1, 10)).unwrap();
    assert_eq!(page.total_pages, 3);
    assert!(!page.has_prev);
    assert!(page.has_next);
  }

  #[test]
  fn test_null_and_scalar_entries_are_dropped() {
    let body = json!([{"id": 1}, null, 7, "x", {"id": 2}]);
    let page = decode_report_page(body, &ReportsQuery::new(1, 10)).unwrap();
    assert_eq!(page.total, 2);
  }

  #[test]
  fn test_shape_mismatch() {
    let query = ReportsQuery::new(1, 10);
    assert!(matches!(
      decode_report_page(json!("oops"), &query),
      Err(ApiError::ShapeMismatch(_))
    ));
    assert!(matches!(
      decode_report_page(json!({"items": []}), &query),
      Err(ApiError::ShapeMismatch(_))
    ));
    assert!(matches!(
      decode_report_page(json!({"reports": {}}), &query),
      Err(ApiError::ShapeMismatch(_))
    ));
  }

  #[test]
  fn test_dashboard_requires_overall() {
    let stats = DashboardStats::decode(json!({
      "overall": {"totalReports": 4, "completedReports": 3.0},
      "projects": [{"name": "Alpha"}]
    }))
    .unwrap();
    assert_eq!(stats.count("totalReports"), 4);
    assert_eq!(stats.count("completedReports"), 3);
    assert_eq!(stats.count("totalIssues"), 0);
    assert_eq!(stats.projects.len(), 1);

    assert!(DashboardStats::decode(json!({"projects": []})).is_err());
  }

  #[test]
  fn test_zeroed_dashboard() {
    let stats = DashboardStats::zeroed();
    assert_eq!(stats.overall.len(), OVERALL_COUNTERS.len());
    assert!(OVERALL_COUNTERS.iter().all(|c| stats.count(c) == 0));
    assert!(stats.projects.is_empty());
  }

  #[test]
  fn test_form_data_decode() {
    let data = FormData::decode(json!({
      "portfolios": [{"id": 1, "name": "Core", "description": null}],
      "projects": [{"id": 5, "name": "Alpha", "portfolio_id": 1}],
      "testers": [{"id": 2, "name": "Alice", "email": "a@example.com"}]
    }))
    .unwrap();
    assert_eq!(data.tester_names(), vec!["Alice"]);
    assert_eq!(data.portfolio_id("core"), Some(1));
    assert_eq!(data.projects[0].portfolio_id, Some(1));
    assert!(data.team_members.is_empty());
  }
}
