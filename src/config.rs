use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_REPORTS_PATH;
use crate::facade::QuerySettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub server: ServerConfig,
  /// Project filter applied at startup
  pub default_project: Option<String>,
  /// Custom title for header (defaults to the server host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Base URL of the report service, e.g. `http://localhost:5000`
  pub url: String,
  #[serde(default = "default_reports_path")]
  pub reports_path: String,
}

fn default_reports_path() -> String {
  DEFAULT_REPORTS_PATH.to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
  pub page_size: u32,
  /// Page size used when the whole collection is needed
  pub fetch_all_limit: u32,
  pub cache_ttl_secs: u64,
  pub search_debounce_ms: u64,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      page_size: 10,
      fetch_all_limit: 1000,
      cache_ttl_secs: 300,
      search_debounce_ms: 300,
    }
  }
}

impl QueryConfig {
  pub fn settings(&self) -> QuerySettings {
    QuerySettings {
      page_size: self.page_size.max(1),
      fetch_all_limit: self.fetch_all_limit.max(1),
      cache_ttl: Duration::from_secs(self.cache_ttl_secs),
      search_debounce: Duration::from_millis(self.search_debounce_ms),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./qa-deck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/qa-deck/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/qa-deck/config.yaml\n\
         with at least:\n\n  server:\n    url: http://localhost:5000"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("qa-deck.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("qa-deck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.server.url.trim().is_empty() {
      return Err(eyre!("server.url must not be empty"));
    }
    Ok(config)
  }

  /// Header title: the configured one, else the server host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    url::Url::parse(&self.server.url)
      .ok()
      .and_then(|u| u.host_str().map(str::to_string))
      .unwrap_or_else(|| self.server.url.clone())
  }

  /// Get the service token from the environment, if any.
  ///
  /// Checks QA_DECK_TOKEN.
  pub fn get_api_token() -> Option<String> {
    std::env::var("QA_DECK_TOKEN")
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::from_yaml("server:\n  url: http://localhost:5000\n").unwrap();
    assert_eq!(config.server.reports_path, "/api/reports");
    assert_eq!(config.query, QueryConfig::default());
    assert_eq!(config.display_title(), "localhost");

    let settings = config.query.settings();
    assert_eq!(settings, QuerySettings::default());
  }

  #[test]
  fn test_query_section_overrides() {
    let config = Config::from_yaml(
      "server:\n  url: http://qa.internal\n  reports_path: /v2/reports\n\
       title: QA Reports\ndefault_project: Alpha\n\
       query:\n  page_size: 0\n  search_debounce_ms: 150\n",
    )
    .unwrap();

    assert_eq!(config.server.reports_path, "/v2/reports");
    assert_eq!(config.display_title(), "QA Reports");
    assert_eq!(config.default_project.as_deref(), Some("Alpha"));

    let settings = config.query.settings();
    assert_eq!(settings.page_size, 1);
    assert_eq!(settings.fetch_all_limit, 1000);
    assert_eq!(settings.search_debounce, Duration::from_millis(150));
  }

  #[test]
  fn test_missing_server_is_an_error() {
    assert!(Config::from_yaml("title: nothing\n").is_err());
    assert!(Config::from_yaml("server:\n  url: ' '\n").is_err());
  }

  #[test]
  fn test_explicit_missing_path_is_an_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
