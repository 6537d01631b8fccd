//! Types describing where a cached read came from.

use std::time::Duration;

/// Result of a cache-first read, including where the data came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// Age of the cached entry when it was served from cache
  pub age: Option<Duration>,
}

impl<T> CacheResult<T> {
  /// Fresh data straight from the service.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      age: None,
    }
  }

  /// Data served from a fresh cache entry.
  pub fn from_cache(data: T, age: Duration) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      age: Some(age),
    }
  }

  /// Placeholder data substituted after a failed fetch.
  pub fn fallback(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Fallback,
      age: None,
    }
  }

  pub fn is_fallback(&self) -> bool {
    self.source == CacheSource::Fallback
  }
}

/// Indicates where data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, within its time-to-live
  CacheFresh,
  /// Network failed; empty or previously held data was served instead
  Fallback,
}
