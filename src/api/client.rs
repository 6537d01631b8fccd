use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::error::ApiError;
use super::types::{decode_report_page, DashboardStats, FormData, ReportsQuery};
use crate::cache::Mutation;
use crate::pagination::PageResult;

/// Default path of the report list endpoint.
pub const DEFAULT_REPORTS_PATH: &str = "/api/reports";

const DASHBOARD_CACHED_PATH: &str = "/api/dashboard/stats/cached";
const DASHBOARD_PATH: &str = "/api/dashboard/stats";
const FORM_DATA_PATH: &str = "/api/form-data";
const PORTFOLIOS_PATH: &str = "/api/portfolios";
const PROJECTS_PATH: &str = "/api/projects";

/// Operations the query layer needs from the report service.
#[async_trait]
pub trait ReportApi: Send + Sync {
  /// One page of reports, normalized into a [`PageResult`].
  async fn fetch_reports(&self, query: &ReportsQuery) -> Result<PageResult, ApiError>;

  async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ApiError>;

  async fn fetch_form_data(&self) -> Result<FormData, ApiError>;

  /// Perform a write. Returns the decoded response body, `Null` when empty.
  async fn send_mutation(&self, mutation: &Mutation) -> Result<Value, ApiError>;
}

/// [`ReportApi`] over HTTP and JSON.
#[derive(Clone)]
pub struct HttpReportApi {
  client: Client,
  base: Url,
  reports_path: String,
  token: Option<String>,
}

impl HttpReportApi {
  pub fn new(base_url: &str, reports_path: &str, token: Option<String>) -> Result<Self, ApiError> {
    let base = Url::parse(base_url)?;
    let client = Client::builder()
      .user_agent(concat!("qa-deck/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      client,
      base,
      reports_path: reports_path.to_string(),
      token,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    Ok(self.base.join(path)?)
  }

  fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
    let request = self
      .client
      .request(method, url)
      .header(ACCEPT, "application/json");
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
    let url = self.endpoint(path)?;
    debug!(%url, "GET");
    let response = self.request(Method::GET, url).query(params).send().await?;
    read_json(response).await
  }

  /// Method, path and body for a write.
  fn route(&self, mutation: &Mutation) -> (Method, String, Option<Value>) {
    let reports = self.reports_path.trim_end_matches('/');
    match mutation {
      Mutation::CreateReport(body) => (Method::POST, reports.to_string(), Some(body.clone())),
      Mutation::UpdateReport { id, body } => {
        (Method::PUT, format!("{}/{}", reports, id), Some(body.clone()))
      }
      Mutation::DeleteReport(id) => (Method::DELETE, format!("{}/{}", reports, id), None),
      Mutation::CreatePortfolio { name } => (
        Method::POST,
        PORTFOLIOS_PATH.to_string(),
        Some(json!({ "name": name })),
      ),
      Mutation::UpdatePortfolio { id, body } => (
        Method::PUT,
        format!("{}/{}", PORTFOLIOS_PATH, id),
        Some(body.clone()),
      ),
      Mutation::DeletePortfolio(id) => {
        (Method::DELETE, format!("{}/{}", PORTFOLIOS_PATH, id), None)
      }
      Mutation::CreateProject { name, portfolio_id } => (
        Method::POST,
        PROJECTS_PATH.to_string(),
        Some(json!({ "name": name, "portfolio_id": portfolio_id })),
      ),
      Mutation::UpdateProject { id, body } => (
        Method::PUT,
        format!("{}/{}", PROJECTS_PATH, id),
        Some(body.clone()),
      ),
      Mutation::DeleteProject(id) => (Method::DELETE, format!("{}/{}", PROJECTS_PATH, id), None),
    }
  }
}

/// Decode a JSON body, turning non-2xx statuses into [`ApiError::Status`].
async fn read_json(response: Response) -> Result<Value, ApiError> {
  let status = response.status();
  let body = response.text().await?;

  if !status.is_success() {
    return Err(ApiError::Status {
      status: status.as_u16(),
      body,
    });
  }

  if body.trim().is_empty() {
    return Ok(Value::Null);
  }
  serde_json::from_str(&body).map_err(|e| ApiError::ShapeMismatch(format!("invalid JSON: {}", e)))
}

#[async_trait]
impl ReportApi for HttpReportApi {
  async fn fetch_reports(&self, query: &ReportsQuery) -> Result<PageResult, ApiError> {
    let body = self.get_json(&self.reports_path, &query.params()).await?;
    decode_report_page(body, query)
  }

  async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
    let cached = self
      .get_json(DASHBOARD_CACHED_PATH, &[])
      .await
      .and_then(DashboardStats::decode);

    match cached {
      Ok(stats) => Ok(stats),
      Err(e) => {
        warn!("Cached dashboard endpoint failed, trying the regular one: {}", e);
        let body = self.get_json(DASHBOARD_PATH, &[]).await?;
        DashboardStats::decode(body)
      }
    }
  }

  async fn fetch_form_data(&self) -> Result<FormData, ApiError> {
    let body = self.get_json(FORM_DATA_PATH, &[]).await?;
    FormData::decode(body)
  }

  async fn send_mutation(&self, mutation: &Mutation) -> Result<Value, ApiError> {
    let (method, path, body) = self.route(mutation);
    let url = self.endpoint(&path)?;
    debug!(%method, %url, "Sending mutation");

    let mut request = self.request(method, url);
    if let Some(body) = body {
      request = request.json(&body);
    }
    read_json(request.send().await?).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn api() -> HttpReportApi {
    HttpReportApi::new("http://localhost:5000", DEFAULT_REPORTS_PATH, None).unwrap()
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    assert!(matches!(
      HttpReportApi::new("not a url", DEFAULT_REPORTS_PATH, None),
      Err(ApiError::Url(_))
    ));
  }

  #[test]
  fn test_endpoint_joins_absolute_paths() {
    let api = HttpReportApi::new("http://qa.local/app/", DEFAULT_REPORTS_PATH, None).unwrap();
    assert_eq!(
      api.endpoint("/api/form-data").unwrap().as_str(),
      "http://qa.local/api/form-data"
    );
  }

  #[test]
  fn test_mutation_routes() {
    let api = api();

    let (method, path, body) = api.route(&Mutation::DeleteReport("12".into()));
    assert_eq!(method, Method::DELETE);
    assert_eq!(path, "/api/reports/12");
    assert!(body.is_none());

    let (method, path, body) = api.route(&Mutation::UpdateReport {
      id: "3".into(),
      body: json!({"title": "x"}),
    });
    assert_eq!(method, Method::PUT);
    assert_eq!(path, "/api/reports/3");
    assert_eq!(body, Some(json!({"title": "x"})));

    let (method, path, body) = api.route(&Mutation::CreateProject {
      name: "Alpha".into(),
      portfolio_id: Some(2),
    });
    assert_eq!(method, Method::POST);
    assert_eq!(path, "/api/projects");
    assert_eq!(body, Some(json!({"name": "Alpha", "portfolio_id": 2})));

    let (method, path, _) = api.route(&Mutation::DeletePortfolio("7".into()));
    assert_eq!(method, Method::DELETE);
    assert_eq!(path, "/api/portfolios/7");
  }
}
