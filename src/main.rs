mod app;
mod commands;
mod event;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use qa_deck::api::HttpReportApi;
use qa_deck::config::Config;
use qa_deck::logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qa-deck")]
#[command(about = "A terminal client for browsing and filtering QA test reports")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/qa-deck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Report service base URL, overriding server.url
  #[arg(short, long)]
  server: Option<String>,

  /// Project to filter by on startup
  #[arg(short, long)]
  project: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = logging::init()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Command line overrides
  if let Some(server) = args.server {
    config.server.url = server;
  }
  if let Some(project) = args.project {
    config.default_project = Some(project);
  }

  let api = HttpReportApi::new(
    &config.server.url,
    &config.server.reports_path,
    Config::get_api_token(),
  )
  .map_err(|e| eyre!("Invalid server URL {}: {}", config.server.url, e))?;

  // Initialize and run the app
  let mut app = app::App::new(config, api);
  app.run().await?;

  Ok(())
}
