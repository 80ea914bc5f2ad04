//! Diagnostics gathered while reading exports.
//!
//! Adapters return these counters alongside their samples instead of
//! printing progress, so callers decide what to show.

pub mod stats;

pub use stats::IngestStats;
