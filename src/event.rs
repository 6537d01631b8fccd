use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use qa_deck::api::{ApiError, DashboardStats, FormData};
use qa_deck::cache::{CacheGeneration, Mutation};
use qa_deck::search::RequestToken;
use qa_deck::{FetchOutcome, PageResult};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh
  Tick,
  /// Result of background query work
  Query(QueryEvent),
}

/// Completions sent back by spawned tasks
#[derive(Debug)]
pub enum QueryEvent {
  Fetched(FetchOutcome),
  /// A debounced search is due
  SearchDue(RequestToken),
  /// Reads carry the cache generation they started under
  DashboardLoaded(CacheGeneration, Result<DashboardStats, ApiError>),
  FormDataLoaded(CacheGeneration, Result<FormData, ApiError>),
  /// The collection, fetched for autocomplete values
  OptionsLoaded(CacheGeneration, Result<PageResult, ApiError>),
  Mutated(Mutation, Result<Value, ApiError>),
}

/// Event handler that merges terminal input, a tick timer and task results
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    let input_tx = tx.clone();
    tokio::spawn(async move {
      let mut reader = EventStream::new();
      let mut tick = tokio::time::interval(tick_rate);

      loop {
        let event = tokio::select! {
          _ = tick.tick() => Event::Tick,
          maybe = reader.next() => match maybe {
            Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => Event::Key(key),
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
              tracing::error!("Terminal input error: {}", e);
              break;
            }
            None => break,
          },
        };

        if input_tx.send(event).is_err() {
          break;
        }
      }
    });

    Self { tx, rx }
  }

  /// Sender for background tasks to report back on
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
