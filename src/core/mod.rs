//! Core computation.
//!
//! This module contains:
//! - The analysis window and caller timestamp parsing
//! - Duration attribution from readings to per-day minutes
//! - Report building and rendering

pub mod attribution;
pub mod report;
pub mod window;

// Re-export commonly used types
pub use attribution::{
    attribute, attribute_with_gap_threshold, Attribution, AttributionPolicy, DailyMinutes,
    LargeGap, DEFAULT_LARGE_GAP_SECS,
};
pub use report::{DailyReport, DayMinutes, ReportFormat};
pub use window::{parse_timestamp, TimeWindow, WindowError};
