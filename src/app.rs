use crate::commands::{self, Action};
use crate::event::{Event, EventHandler, QueryEvent};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, SearchEvent, SearchInput};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use qa_deck::api::{DashboardStats, HttpReportApi, ReportApi};
use qa_deck::cache::{CacheResult, EntityKind, Mutation};
use qa_deck::config::Config;
use qa_deck::filter::{ActiveFilter, FilterOptions};
use qa_deck::{FilterKey, Notice, PageResult, QueryPlan, ReportQuery};
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Main application state
pub struct App {
  /// Application configuration
  config: Config,

  /// Query facade over the report service
  query: ReportQuery<HttpReportApi>,

  /// Page currently on screen
  page: PageResult,
  current_page: u32,
  loading: bool,
  table_state: TableState,

  search: SearchInput,
  command: CommandInput,

  /// Dashboard popup
  stats: Option<CacheResult<DashboardStats>>,
  show_stats: bool,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, api: HttpReportApi) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut query = ReportQuery::new(Arc::new(api), config.query.settings());

    if let Some(project) = config.default_project.as_deref() {
      query.set_filter(FilterKey::Project, project);
    }

    Self {
      config,
      query,
      page: PageResult::default(),
      current_page: 1,
      loading: false,
      table_state: TableState::default(),
      search: SearchInput::new(),
      command: CommandInput::new(),
      stats: None,
      show_stats: false,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    info!(server = %self.config.server.url, "Starting session");
    self.load_form_data();
    self.run_query(1);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // UI refresh happens automatically
      Event::Query(query_event) => self.handle_query_event(query_event),
    }
  }

  // Queries

  fn run_query(&mut self, page: u32) {
    self.current_page = page;
    let plan = self.query.plan(page);
    self.apply_plan(plan);
  }

  fn apply_plan(&mut self, plan: QueryPlan) {
    match plan {
      QueryPlan::Ready(page) => self.show_page(page),
      QueryPlan::Fetch(request) => {
        self.loading = true;
        let api = self.query.api();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          let outcome = request.run(api.as_ref()).await;
          let _ = tx.send(Event::Query(QueryEvent::Fetched(outcome)));
        });
      }
    }
  }

  fn show_page(&mut self, page: PageResult) {
    self.loading = false;
    self.current_page = page.page;
    self.page = page;

    let len = self.page.reports.len();
    if len == 0 {
      self.table_state.select(None);
    } else {
      let selected = self.table_state.selected().unwrap_or(0).min(len - 1);
      self.table_state.select(Some(selected));
    }
  }

  fn handle_query_event(&mut self, event: QueryEvent) {
    match event {
      QueryEvent::Fetched(outcome) => {
        if let Some(page) = self.query.complete(outcome) {
          self.show_page(page);
        }
      }
      QueryEvent::SearchDue(token) => {
        if let Some(plan) = self.query.search_due(token) {
          self.current_page = 1;
          self.apply_plan(plan);
        }
      }
      QueryEvent::DashboardLoaded(generation, result) => {
        if let Some(stats) = self.query.finish_dashboard_stats(generation, result) {
          self.stats = Some(stats);
        }
      }
      QueryEvent::FormDataLoaded(generation, result) => {
        self.query.finish_form_data(generation, result);
      }
      QueryEvent::OptionsLoaded(generation, result) => {
        self.query.finish_options_load(generation, result);
      }
      QueryEvent::Mutated(mutation, result) => {
        if self.query.finish_mutation(&mutation, result).is_err() {
          return;
        }
        if mutation.entity() != EntityKind::Report {
          self.load_form_data();
        }
        if self.show_stats {
          self.open_stats();
        }
        self.run_query(self.current_page);
      }
    }
  }

  fn load_form_data(&self) {
    if self.query.cached_form_data().is_some() {
      return;
    }
    let generation = self.query.cache_generation();
    let api = self.query.api();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = api.fetch_form_data().await;
      let _ = tx.send(Event::Query(QueryEvent::FormDataLoaded(generation, result)));
    });
  }

  /// Fetch what autocomplete values are drawn from, if not already held.
  fn load_filter_options(&self) {
    self.load_form_data();
    let Some(request) = self.query.options_request() else {
      return;
    };
    let generation = self.query.cache_generation();
    let api = self.query.api();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = api.fetch_reports(&request).await;
      let _ = tx.send(Event::Query(QueryEvent::OptionsLoaded(generation, result)));
    });
  }

  fn open_stats(&mut self) {
    self.show_stats = true;
    if let Some(cached) = self.query.cached_dashboard_stats() {
      self.stats = Some(cached);
      return;
    }

    self.stats = None;
    let generation = self.query.cache_generation();
    let api = self.query.api();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = api.fetch_dashboard_stats().await;
      let _ = tx.send(Event::Query(QueryEvent::DashboardLoaded(generation, result)));
    });
  }

  fn mutate(&mut self, mutation: Mutation) {
    debug!(mutation = %mutation.describe(), "Sending mutation");
    let api = self.query.api();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = api.send_mutation(&mutation).await;
      let _ = tx.send(Event::Query(QueryEvent::Mutated(mutation, result)));
    });
  }

  // Keys

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if self.search.is_active() {
      match self.search.handle_key(key) {
        KeyResult::Event(SearchEvent::Changed(text)) => {
          let tx = self.event_tx.clone();
          self.query.on_search_input(&text, move |token| {
            let _ = tx.send(Event::Query(QueryEvent::SearchDue(token)));
          });
        }
        KeyResult::Event(SearchEvent::Submitted) => {
          let plan = self.query.on_search_submit();
          self.current_page = 1;
          self.apply_plan(plan);
        }
        KeyResult::Handled | KeyResult::NotHandled => {}
      }
      return;
    }

    let options = self.filter_options();
    let was_active = self.command.is_active();
    match self.command.handle_key(key, &options) {
      KeyResult::Event(CommandEvent::Submitted(input)) => {
        self.execute_command(&input);
        return;
      }
      KeyResult::Handled if !was_active => {
        // Overlay just opened
        self.load_filter_options();
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    self.handle_normal_key(key);
  }

  fn handle_normal_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Esc => {
        if self.show_stats {
          self.show_stats = false;
        } else {
          self.query.dismiss_notice();
        }
      }
      KeyCode::Char('/') => {
        let current = self.query.criteria().search.clone();
        self.search.activate(&current);
      }

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => self.table_state.select_next(),
      KeyCode::Up | KeyCode::Char('k') => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right if self.page.has_next => {
        self.run_query(self.current_page + 1);
      }
      KeyCode::Char('p') | KeyCode::Left if self.page.has_prev => {
        self.run_query(self.current_page.saturating_sub(1).max(1));
      }

      KeyCode::Char('r') => {
        self.query.refresh();
        self.run_query(self.current_page);
      }
      KeyCode::Char('s') => {
        if self.show_stats {
          self.show_stats = false;
        } else {
          self.open_stats();
        }
      }
      KeyCode::Char('x') => {
        self.query.dismiss_notice();
      }
      _ => {}
    }
  }

  fn execute_command(&mut self, input: &str) {
    if input.is_empty() {
      return;
    }

    let action = match commands::parse(input) {
      Ok(action) => action,
      Err(message) => {
        self.query.notify(Notice::error(message));
        return;
      }
    };

    match action {
      Action::SetFilter(key, value) => {
        self.query.set_filter(key, &value);
        self.run_query(1);
      }
      Action::RemoveFilter(key) => {
        self.query.remove_filter(key);
        self.run_query(1);
      }
      Action::Quick(quick) => {
        self
          .query
          .apply_quick_filter(quick, chrono::Local::now().date_naive());
        self.run_query(1);
      }
      Action::ClearFilters => {
        self.query.clear_filters();
        self.run_query(1);
      }
      Action::Refresh => {
        self.query.refresh();
        self.run_query(self.current_page);
      }
      Action::Stats => self.open_stats(),
      Action::Delete(id) => {
        let id = id.or_else(|| self.selected_report_id());
        match id {
          Some(id) => self.mutate(Mutation::DeleteReport(id)),
          None => self
            .query
            .notify(Notice::warning("No report selected to delete")),
        }
      }
      Action::AddPortfolio(name) => self.mutate(Mutation::CreatePortfolio { name }),
      Action::AddProject { name, portfolio } => {
        let portfolio_id = match portfolio {
          None => None,
          Some(portfolio) => {
            let id = self
              .query
              .state()
              .caches
              .form_data
              .get()
              .and_then(|data| data.portfolio_id(&portfolio));
            match id {
              Some(id) => Some(id),
              None => {
                self
                  .query
                  .notify(Notice::warning(format!("Unknown portfolio: {}", portfolio)));
                self.load_form_data();
                return;
              }
            }
          }
        };
        self.mutate(Mutation::CreateProject { name, portfolio_id });
      }
      Action::Quit => self.should_quit = true,
    }
  }

  fn selected_report_id(&self) -> Option<String> {
    self
      .table_state
      .selected()
      .and_then(|i| self.page.reports.get(i))
      .and_then(|report| report.id())
  }

  // Accessors for UI rendering

  pub fn title(&self) -> String {
    self.config.display_title()
  }

  pub fn page(&self) -> &PageResult {
    &self.page
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  /// The page and its selection, borrowed together for stateful rendering
  pub fn table_parts(&mut self) -> (&PageResult, &mut TableState) {
    (&self.page, &mut self.table_state)
  }

  pub fn active_filters(&self) -> Vec<ActiveFilter> {
    self.query.active_filter_summary()
  }

  pub fn filter_options(&self) -> FilterOptions {
    self.query.filter_options()
  }

  pub fn current_notice(&self) -> Option<&Notice> {
    self.query.current_notice()
  }

  pub fn search(&self) -> &SearchInput {
    &self.search
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  /// Dashboard data when the popup is open; the inner `None` means loading
  pub fn stats_popup(&self) -> Option<Option<&CacheResult<DashboardStats>>> {
    self.show_stats.then_some(self.stats.as_ref())
  }
}
