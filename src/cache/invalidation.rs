//! Which caches a successful mutation drops.

use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::collection::ReportCollection;
use super::timed::TimedCache;
use crate::api::{DashboardStats, FormData};

/// The kind of server entity a mutation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  Report,
  Portfolio,
  Project,
}

/// A write against the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
  CreateReport(Value),
  UpdateReport { id: String, body: Value },
  DeleteReport(String),
  CreatePortfolio { name: String },
  UpdatePortfolio { id: String, body: Value },
  DeletePortfolio(String),
  CreateProject { name: String, portfolio_id: Option<i64> },
  UpdateProject { id: String, body: Value },
  DeleteProject(String),
}

impl Mutation {
  pub fn entity(&self) -> EntityKind {
    match self {
      Mutation::CreateReport(_) | Mutation::UpdateReport { .. } | Mutation::DeleteReport(_) => {
        EntityKind::Report
      }
      Mutation::CreatePortfolio { .. }
      | Mutation::UpdatePortfolio { .. }
      | Mutation::DeletePortfolio(_) => EntityKind::Portfolio,
      Mutation::CreateProject { .. }
      | Mutation::UpdateProject { .. }
      | Mutation::DeleteProject(_) => EntityKind::Project,
    }
  }

  /// Short description for logs and notices.
  pub fn describe(&self) -> String {
    match self {
      Mutation::CreateReport(_) => "create report".to_string(),
      Mutation::UpdateReport { id, .. } => format!("update report {}", id),
      Mutation::DeleteReport(id) => format!("delete report {}", id),
      Mutation::CreatePortfolio { name } => format!("create portfolio '{}'", name),
      Mutation::UpdatePortfolio { id, .. } => format!("update portfolio {}", id),
      Mutation::DeletePortfolio(id) => format!("delete portfolio {}", id),
      Mutation::CreateProject { name, .. } => format!("create project '{}'", name),
      Mutation::UpdateProject { id, .. } => format!("update project {}", id),
      Mutation::DeleteProject(id) => format!("delete project {}", id),
    }
  }
}

/// Number of invalidations a [`CacheSet`] has seen. A fetch started under an
/// older generation must not be stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheGeneration(u64);

/// Every cache the query subsystem holds.
#[derive(Debug, Clone)]
pub struct CacheSet {
  pub reports: ReportCollection,
  pub dashboard: TimedCache<DashboardStats>,
  pub form_data: TimedCache<FormData>,
  generation: CacheGeneration,
}

impl CacheSet {
  pub fn new(ttl: Duration) -> Self {
    Self {
      reports: ReportCollection::new(),
      dashboard: TimedCache::new(ttl),
      form_data: TimedCache::new(ttl),
      generation: CacheGeneration::default(),
    }
  }

  pub fn generation(&self) -> CacheGeneration {
    self.generation
  }

  /// Whether data fetched under `generation` may still be stored.
  pub fn is_current(&self, generation: CacheGeneration) -> bool {
    self.generation == generation
  }

  fn advance(&mut self) {
    self.generation.0 += 1;
  }

  /// Drop the report collection only. Returns whether it was loaded.
  pub fn invalidate_reports(&mut self) -> bool {
    self.advance();
    self.reports.invalidate()
  }

  /// Drop whatever a successful write to `entity` made stale. The collection
  /// is dropped whole, never patched.
  pub fn invalidate_for(&mut self, entity: EntityKind) {
    self.advance();
    self.reports.invalidate();
    self.dashboard.invalidate();
    if matches!(entity, EntityKind::Portfolio | EntityKind::Project) {
      self.form_data.invalidate();
    }
    debug!(?entity, "Invalidated caches after mutation");
  }

  pub fn invalidate_all(&mut self) {
    self.advance();
    self.reports.invalidate();
    self.dashboard.invalidate();
    self.form_data.invalidate();
    debug!("Invalidated all caches");
  }
}

impl Default for CacheSet {
  fn default() -> Self {
    Self::new(super::timed::DEFAULT_TTL)
  }
}
