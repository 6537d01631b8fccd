//! Report records and their canonical fields.

pub mod fields;
mod record;

pub use record::Report;
