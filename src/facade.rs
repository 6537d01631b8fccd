//! Report query orchestration.
//!
//! [`ReportQuery`] owns the session state (criteria, caches, notices) and
//! decides for every query whether cached data can answer it or a fetch is
//! needed. Fetches are split in three steps so a UI loop can run the network
//! part on a spawned task:
//!
//! ```ignore
//! match query.plan(page) {
//!     QueryPlan::Ready(page) => show(page),
//!     QueryPlan::Fetch(request) => {
//!         let api = query.api();
//!         tokio::spawn(async move {
//!             let outcome = request.run(api.as_ref()).await;
//!             tx.send(Event::Fetched(outcome))
//!         });
//!     }
//! }
//!
//! // later, on the UI task
//! if let Some(page) = query.complete(outcome) {
//!     show(page);
//! }
//! ```
//!
//! Every plan issues a new [`RequestToken`]; outcomes carrying an older token
//! are discarded.

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{ApiError, DashboardStats, FormData, ReportApi, ReportsQuery};
use crate::cache::{CacheGeneration, CacheResult, CacheSet, Mutation, DEFAULT_TTL};
use crate::filter::{
  filter_reports, sort_reports, ActiveFilter, FilterCriteria, FilterKey, FilterOptions, QuickFilter,
};
use crate::pagination::{PageResult, PaginationStrategy};
use crate::report::Report;
use crate::search::{RequestToken, SearchDebouncer, DEFAULT_DEBOUNCE};

/// Oldest notices are dropped past this many.
const MAX_NOTICES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Warning,
  Error,
}

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Info,
      message: message.into(),
    }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Warning,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: message.into(),
    }
  }
}

/// Notice for a failed read. Transport-class failures are recoverable warnings.
fn read_failure(what: &str, e: &ApiError) -> Notice {
  let message = format!("{}: {}", what, e);
  if e.is_transport() {
    Notice::warning(message)
  } else {
    Notice::error(message)
  }
}

impl fmt::Display for Notice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

/// Tunables of a query session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
  /// Rows per server page
  pub page_size: u32,
  /// Page size used to fetch the whole collection
  pub fetch_all_limit: u32,
  pub cache_ttl: Duration,
  pub search_debounce: Duration,
}

impl Default for QuerySettings {
  fn default() -> Self {
    Self {
      page_size: 10,
      fetch_all_limit: 1000,
      cache_ttl: DEFAULT_TTL,
      search_debounce: DEFAULT_DEBOUNCE,
    }
  }
}

/// Everything a query session remembers between calls.
#[derive(Debug)]
pub struct QuerySessionState {
  pub criteria: FilterCriteria,
  pub caches: CacheSet,
  notices: VecDeque<Notice>,
  /// Last page the server answered, served again when a page fetch fails
  last_page: Option<PageResult>,
}

impl QuerySessionState {
  pub fn new(cache_ttl: Duration) -> Self {
    Self {
      criteria: FilterCriteria::default(),
      caches: CacheSet::new(cache_ttl),
      notices: VecDeque::new(),
      last_page: None,
    }
  }

  fn notify(&mut self, notice: Notice) {
    if self.notices.len() == MAX_NOTICES {
      self.notices.pop_front();
    }
    self.notices.push_back(notice);
  }
}

/// What a fetch asks the service for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
  /// The whole collection, for client-side filtering
  FetchAll { limit: u32 },
  /// One server page
  ServerPage(ReportsQuery),
}

/// A fetch that still has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub token: RequestToken,
  pub kind: FetchKind,
}

impl FetchRequest {
  fn query(&self) -> ReportsQuery {
    match &self.kind {
      FetchKind::FetchAll { limit } => ReportsQuery::whole_collection(*limit),
      FetchKind::ServerPage(query) => query.clone(),
    }
  }

  /// Perform the network part of the request.
  pub async fn run<A: ReportApi + ?Sized>(self, api: &A) -> FetchOutcome {
    let result = api.fetch_reports(&self.query()).await;
    FetchOutcome {
      token: self.token,
      kind: self.kind,
      result,
    }
  }
}

/// A finished fetch, to be handed back to [`ReportQuery::complete`].
#[derive(Debug)]
pub struct FetchOutcome {
  pub token: RequestToken,
  pub kind: FetchKind,
  pub result: Result<PageResult, ApiError>,
}

/// Result of planning a query.
#[derive(Debug)]
pub enum QueryPlan {
  /// Answered from memory
  Ready(PageResult),
  /// Needs the service
  Fetch(FetchRequest),
}

/// Filter, sort and present a loaded collection as a single page.
fn client_page(reports: &[Report], criteria: &FilterCriteria) -> PageResult {
  let matching = filter_reports(reports, criteria);
  let sorted = sort_reports(matching, criteria.sort);
  PageResult::single(sorted.into_iter().cloned().collect())
}

/// Query facade over a [`ReportApi`].
pub struct ReportQuery<A> {
  api: Arc<A>,
  settings: QuerySettings,
  state: QuerySessionState,
  debouncer: SearchDebouncer,
}

impl<A: ReportApi> ReportQuery<A> {
  pub fn new(api: Arc<A>, settings: QuerySettings) -> Self {
    Self {
      api,
      state: QuerySessionState::new(settings.cache_ttl),
      debouncer: SearchDebouncer::new(settings.search_debounce),
      settings,
    }
  }

  pub fn api(&self) -> Arc<A> {
    Arc::clone(&self.api)
  }

  pub fn settings(&self) -> &QuerySettings {
    &self.settings
  }

  pub fn state(&self) -> &QuerySessionState {
    &self.state
  }

  pub fn criteria(&self) -> &FilterCriteria {
    &self.state.criteria
  }

  // Queries

  /// Decide how to answer page `page` of the current criteria.
  ///
  /// Cancels any pending search timer and supersedes in-flight fetches.
  pub fn plan(&mut self, page: u32) -> QueryPlan {
    let token = self.debouncer.immediate();
    let criteria = &self.state.criteria;

    match PaginationStrategy::select(criteria, page, self.settings.page_size) {
      PaginationStrategy::ClientFiltered => match self.state.caches.reports.get() {
        Some(reports) => {
          debug!(count = reports.len(), "Filtering cached collection");
          QueryPlan::Ready(client_page(reports, criteria))
        }
        None => {
          debug!(?token, "Collection not loaded, fetching all reports");
          QueryPlan::Fetch(FetchRequest {
            token,
            kind: FetchKind::FetchAll {
              limit: self.settings.fetch_all_limit,
            },
          })
        }
      },
      PaginationStrategy::ServerPaginated { page, limit } => {
        debug!(?token, page, limit, "Fetching server page");
        QueryPlan::Fetch(FetchRequest {
          token,
          kind: FetchKind::ServerPage(ReportsQuery::new(page, limit).with_search(&criteria.search)),
        })
      }
    }
  }

  /// Apply a finished fetch. Returns `None` when a newer request superseded it.
  ///
  /// Failures keep whatever was held before and queue a notice.
  pub fn complete(&mut self, outcome: FetchOutcome) -> Option<PageResult> {
    if !self.debouncer.is_latest(outcome.token) {
      debug!(token = ?outcome.token, "Discarding stale response");
      return None;
    }

    let page = match (outcome.kind, outcome.result) {
      (FetchKind::FetchAll { limit }, Ok(page)) => {
        let loaded = page.reports.len() as u64;
        if page.total > loaded {
          warn!(
            total = page.total,
            loaded, limit, "Service holds more reports than one fetch returns"
          );
          self.state.notify(Notice::warning(format!(
            "Filtering {} of {} reports; raise query.fetch_all_limit to include the rest",
            loaded, page.total
          )));
        }
        info!(count = page.reports.len(), "Loaded report collection");
        self.state.caches.reports.replace(page.reports);
        self.current_client_page()
      }
      (FetchKind::FetchAll { .. }, Err(e)) => {
        warn!(status = ?e.status(), "Failed to load reports: {}", e);
        self.state.notify(read_failure("Could not load reports", &e));
        self.current_client_page()
      }
      (FetchKind::ServerPage(_), Ok(page)) => {
        self.state.last_page = Some(page.clone());
        page
      }
      (FetchKind::ServerPage(query), Err(e)) => {
        warn!(page = query.page, status = ?e.status(), "Failed to fetch report page: {}", e);
        self.state.notify(read_failure("Could not load reports", &e));
        self.state.last_page.clone().unwrap_or_default()
      }
    };
    Some(page)
  }

  fn current_client_page(&self) -> PageResult {
    self
      .state
      .caches
      .reports
      .get()
      .map(|reports| client_page(reports, &self.state.criteria))
      .unwrap_or_default()
  }

  /// Page `page` of the current criteria, fetching as needed.
  pub async fn query(&mut self, page: u32) -> PageResult {
    match self.plan(page) {
      QueryPlan::Ready(page) => page,
      QueryPlan::Fetch(request) => {
        let outcome = request.run(self.api.as_ref()).await;
        self.complete(outcome).unwrap_or_default()
      }
    }
  }

  /// Replace the criteria and query page `page`.
  pub async fn query_reports(&mut self, criteria: FilterCriteria, page: u32) -> PageResult {
    self.state.criteria = criteria;
    self.query(page).await
  }

  // Search

  /// Record typed search text and restart the debounce timer. `on_due` is
  /// called with the token once typing pauses; pass it to
  /// [`search_due`](Self::search_due).
  pub fn on_search_input<F>(&mut self, text: &str, on_due: F) -> RequestToken
  where
    F: FnOnce(RequestToken) + Send + 'static,
  {
    self.state.criteria.search = text.to_string();
    self.debouncer.schedule(on_due)
  }

  /// Plan the debounced search for `token`, unless something newer ran since.
  pub fn search_due(&mut self, token: RequestToken) -> Option<QueryPlan> {
    if !self.debouncer.is_latest(token) {
      debug!(?token, "Dropping superseded search");
      return None;
    }
    Some(self.plan(1))
  }

  /// Run the search now, skipping the timer.
  pub fn on_search_submit(&mut self) -> QueryPlan {
    self.plan(1)
  }

  // Dashboard and dropdown data

  pub fn cached_dashboard_stats(&self) -> Option<CacheResult<DashboardStats>> {
    let cache = &self.state.caches.dashboard;
    let age = cache.age()?;
    cache
      .get()
      .map(|stats| CacheResult::from_cache(stats.clone(), age))
  }

  /// Generation to hand back with a fetch result, see
  /// [`finish_dashboard_stats`](Self::finish_dashboard_stats).
  pub fn cache_generation(&self) -> CacheGeneration {
    self.state.caches.generation()
  }

  /// Store a dashboard fetch started under `generation`. Returns `None` when
  /// the caches were invalidated since; the result is then dropped.
  pub fn finish_dashboard_stats(
    &mut self,
    generation: CacheGeneration,
    result: Result<DashboardStats, ApiError>,
  ) -> Option<CacheResult<DashboardStats>> {
    if !self.state.caches.is_current(generation) {
      debug!("Dropping dashboard stats fetched before invalidation");
      return None;
    }
    Some(self.store_dashboard_stats(result))
  }

  /// Failures yield zeroed stats that are not cached.
  fn store_dashboard_stats(
    &mut self,
    result: Result<DashboardStats, ApiError>,
  ) -> CacheResult<DashboardStats> {
    match result {
      Ok(stats) => {
        self.state.caches.dashboard.set(stats.clone());
        CacheResult::from_network(stats)
      }
      Err(e) => {
        warn!(status = ?e.status(), "Failed to fetch dashboard stats: {}", e);
        self.state.notify(read_failure("Dashboard unavailable", &e));
        CacheResult::fallback(DashboardStats::zeroed())
      }
    }
  }

  pub async fn dashboard_stats(&mut self) -> CacheResult<DashboardStats> {
    if let Some(cached) = self.cached_dashboard_stats() {
      debug!("Dashboard stats cache hit");
      return cached;
    }
    let result = self.api.fetch_dashboard_stats().await;
    self.store_dashboard_stats(result)
  }

  pub fn cached_form_data(&self) -> Option<CacheResult<FormData>> {
    let cache = &self.state.caches.form_data;
    let age = cache.age()?;
    cache
      .get()
      .map(|data| CacheResult::from_cache(data.clone(), age))
  }

  /// Store a form data fetch started under `generation`. Returns `None` when
  /// the caches were invalidated since.
  pub fn finish_form_data(
    &mut self,
    generation: CacheGeneration,
    result: Result<FormData, ApiError>,
  ) -> Option<CacheResult<FormData>> {
    if !self.state.caches.is_current(generation) {
      debug!("Dropping form data fetched before invalidation");
      return None;
    }
    Some(self.store_form_data(result))
  }

  /// Failures yield empty data that is not cached.
  fn store_form_data(&mut self, result: Result<FormData, ApiError>) -> CacheResult<FormData> {
    match result {
      Ok(data) => {
        self.state.caches.form_data.set(data.clone());
        CacheResult::from_network(data)
      }
      Err(e) => {
        warn!(status = ?e.status(), "Failed to fetch form data: {}", e);
        self.state.notify(read_failure("Dropdown data unavailable", &e));
        CacheResult::fallback(FormData::default())
      }
    }
  }

  pub async fn form_data(&mut self) -> CacheResult<FormData> {
    if let Some(cached) = self.cached_form_data() {
      return cached;
    }
    let result = self.api.fetch_form_data().await;
    self.store_form_data(result)
  }

  /// Picker values from whatever is loaded right now.
  pub fn filter_options(&self) -> FilterOptions {
    let options = FilterOptions::from_reports(self.state.caches.reports.get().unwrap_or_default());
    match self.state.caches.form_data.get() {
      Some(data) => options.with_fallback_testers(data.tester_names()),
      None => options,
    }
  }

  /// The collection request picker values need, or `None` when it is loaded.
  ///
  /// Runs outside the token sequence so it never supersedes a displayed query.
  pub fn options_request(&self) -> Option<ReportsQuery> {
    (!self.state.caches.reports.is_loaded())
      .then(|| ReportsQuery::whole_collection(self.settings.fetch_all_limit))
  }

  /// Store a collection fetched for the pickers under `generation`. Ignored
  /// when the caches were invalidated since or a query already loaded it.
  pub fn finish_options_load(
    &mut self,
    generation: CacheGeneration,
    result: Result<PageResult, ApiError>,
  ) {
    match result {
      Ok(_) if !self.state.caches.is_current(generation) => {
        debug!("Dropping filter option data fetched before invalidation");
      }
      Ok(_) if self.state.caches.reports.is_loaded() => {}
      Ok(page) => {
        debug!(count = page.reports.len(), "Loaded collection for filter options");
        self.state.caches.reports.replace(page.reports);
      }
      Err(e) => {
        warn!(status = ?e.status(), "Failed to load reports for filter options: {}", e);
        self
          .state
          .notify(read_failure("Could not load filter options", &e));
      }
    }
  }

  /// Picker values, loading the collection and the tester fallback if needed.
  pub async fn load_filter_options(&mut self) -> FilterOptions {
    if let Some(query) = self.options_request() {
      let generation = self.cache_generation();
      let result = self.api.fetch_reports(&query).await;
      self.finish_options_load(generation, result);
    }

    let options = self.filter_options();
    if options.testers.is_empty() {
      let data = self.form_data().await.data;
      return options.with_fallback_testers(data.tester_names());
    }
    options
  }

  // Mutations and invalidation

  /// Send a write and invalidate on success.
  pub async fn mutate(&mut self, mutation: Mutation) -> Result<Value, ApiError> {
    let result = self.api.send_mutation(&mutation).await;
    self.finish_mutation(&mutation, result)
  }

  /// Apply a write's result. Only success invalidates.
  pub fn finish_mutation(
    &mut self,
    mutation: &Mutation,
    result: Result<Value, ApiError>,
  ) -> Result<Value, ApiError> {
    match &result {
      Ok(_) => {
        info!(mutation = %mutation.describe(), "Mutation succeeded");
        self.state.caches.invalidate_for(mutation.entity());
        self.supersede_fetches();
        self.state.last_page = None;
        self
          .state
          .notify(Notice::info(format!("Done: {}", mutation.describe())));
      }
      Err(e) => {
        warn!(mutation = %mutation.describe(), "Mutation failed: {}", e);
        self.state.notify(Notice::error(format!(
          "Failed to {}: {}",
          mutation.describe(),
          e
        )));
      }
    }
    result
  }

  /// Drop every cache so the next reads refetch.
  pub fn invalidate_caches(&mut self) {
    self.state.caches.invalidate_all();
    self.state.last_page = None;
    self.supersede_fetches();
  }

  /// Drop the report collection, keeping criteria.
  pub fn refresh(&mut self) {
    if self.state.caches.invalidate_reports() {
      debug!("Report collection dropped for refresh");
    }
    self.supersede_fetches();
  }

  /// Outcomes of fetches already in flight carry pre-invalidation data and
  /// must not refill the caches.
  fn supersede_fetches(&mut self) {
    let token = self.debouncer.immediate();
    debug!(?token, "Superseded in-flight fetches");
  }

  // Criteria

  pub fn active_filter_summary(&self) -> Vec<ActiveFilter> {
    self.state.criteria.active_summary()
  }

  pub fn set_filter(&mut self, key: FilterKey, value: &str) {
    self.state.criteria.set(key, value);
  }

  pub fn remove_filter(&mut self, key: FilterKey) {
    self.state.criteria.remove(key);
  }

  pub fn clear_filters(&mut self) {
    self.state.criteria.clear_all();
  }

  pub fn apply_quick_filter(&mut self, quick: QuickFilter, today: NaiveDate) {
    self.state.criteria.apply_quick_filter(quick, today);
  }

  // Notices

  pub fn notices(&self) -> impl Iterator<Item = &Notice> {
    self.state.notices.iter()
  }

  /// Queue a notice raised outside the query layer.
  pub fn notify(&mut self, notice: Notice) {
    self.state.notify(notice);
  }

  /// The oldest undismissed notice.
  pub fn current_notice(&self) -> Option<&Notice> {
    self.state.notices.front()
  }

  pub fn dismiss_notice(&mut self) -> Option<Notice> {
    self.state.notices.pop_front()
  }
}
