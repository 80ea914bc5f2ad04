//! Heart-rate threshold minutes.
//!
//! Estimates how many minutes per day a wearer's heart rate stayed at or
//! above a threshold, from Apple Health and Fitbit data exports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Heart-Rate Threshold Minutes                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐                                             │
//! │  │ Apple Health │──┐                                          │
//! │  │ (stream XML) │  │   ┌─────────────┐   ┌─────────────┐      │
//! │  └──────────────┘  ├──▶│ Attribution │──▶│   Report    │      │
//! │  ┌──────────────┐  │   │ (per day)   │   │ (text/json) │      │
//! │  │    Fitbit    │──┘   └─────────────┘   └─────────────┘      │
//! │  │ (daily JSON) │          ▲                                  │
//! │  └──────────────┘          │ AttributionPolicy per source     │
//! │         │                                                     │
//! │         ▼                                                     │
//! │  ┌──────────────┐                                             │
//! │  │ IngestStats  │                                             │
//! │  └──────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hr_threshold_minutes::{attribute, AttributionPolicy, DailyReport, HealthExportSource};
//! use hr_threshold_minutes::{SampleSource, TimeWindow};
//!
//! let window = TimeWindow::parse("2025-11-10 10:00:00", "2025-12-01 23:59:00").unwrap();
//! let source = HealthExportSource::new("export.xml");
//! let outcome = source.load(&window).expect("readable export");
//!
//! let attribution = attribute(&outcome.samples, 140.0, &AttributionPolicy::APPLE_HEALTH);
//! println!("{}", DailyReport::new(&attribution.daily_minutes, &window, 140.0));
//! ```

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod source;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{
    attribute, Attribution, AttributionPolicy, DailyMinutes, DailyReport, ReportFormat,
    TimeWindow, WindowError,
};
pub use diagnostics::IngestStats;
pub use source::{
    FitbitExportSource, HealthExportSource, IngestOutcome, Sample, SampleSource, SourceError,
    SourceKind,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
