//! Caches held by a query session.
//!
//! - [`TimedCache`]: single-slot value with a time-to-live (dashboard stats,
//!   form dropdown data)
//! - [`ReportCollection`]: the full report list, freshened only by
//!   invalidation
//! - [`CacheSet`]: all of the above, plus the rules a mutation triggers

mod collection;
mod invalidation;
mod timed;
mod traits;

pub use collection::ReportCollection;
pub use invalidation::{CacheGeneration, CacheSet, EntityKind, Mutation};
pub use timed::{TimedCache, DEFAULT_TTL};
pub use traits::{CacheResult, CacheSource};
