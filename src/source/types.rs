//! Normalized heart-rate sample types shared by every export adapter.
//!
//! Both adapters reduce their input to the same [`Sample`] shape so the
//! attribution engine never needs to know where a reading came from.

use crate::core::window::TimeWindow;
use crate::diagnostics::IngestStats;
use crate::source::error::SourceError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single instantaneous heart-rate observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the reading was taken
    pub timestamp: DateTime<FixedOffset>,
    /// Beats per minute
    pub heart_rate: f64,
    /// Calendar date the reading is bucketed under
    pub date_key: NaiveDate,
}

impl Sample {
    /// Build a sample from an offset-qualified instant.
    ///
    /// The date key is the UTC calendar date, regardless of the offset the
    /// instant was recorded with.
    pub fn from_offset(timestamp: DateTime<FixedOffset>, heart_rate: f64) -> Self {
        Self {
            date_key: timestamp.with_timezone(&Utc).date_naive(),
            timestamp,
            heart_rate,
        }
    }

    /// Build a sample from a timezone-naive wall-clock time.
    ///
    /// The wall clock is carried with a `+00:00` offset so it orders and
    /// subtracts like any other instant; the date key is the wall-clock date.
    pub fn from_naive(timestamp: NaiveDateTime, heart_rate: f64) -> Self {
        Self {
            date_key: timestamp.date(),
            timestamp: timestamp.and_utc().fixed_offset(),
            heart_rate,
        }
    }
}

/// Which platform an export came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Apple Health `export.xml`
    AppleHealth,
    /// Directory of Fitbit `heart_rate-*.json` files
    Fitbit,
}

impl SourceKind {
    /// Human-readable platform name.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::AppleHealth => "Apple Health",
            SourceKind::Fitbit => "Fitbit",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Samples produced by one ingestion run, plus the counters gathered on the way.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub samples: Vec<Sample>,
    pub stats: IngestStats,
}

impl IngestOutcome {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Anything that can turn a platform export into in-window samples.
pub trait SampleSource {
    /// The platform this source reads.
    fn kind(&self) -> SourceKind;

    /// Read the export and return every valid sample inside `window`.
    ///
    /// Malformed individual records are skipped and counted; a missing or
    /// structurally broken export is an error.
    fn load(&self, window: &TimeWindow) -> Result<IngestOutcome, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_offset_sample_uses_utc_date() {
        // 23:30 at -05:00 is already the next day in UTC
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let ts = offset.with_ymd_and_hms(2025, 1, 12, 23, 30, 0).unwrap();
        let sample = Sample::from_offset(ts, 150.0);

        assert_eq!(sample.date_key, NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
        assert_eq!(sample.timestamp, ts);
    }

    #[test]
    fn test_naive_sample_uses_wall_clock_date() {
        let ts = NaiveDate::from_ymd_opt(2025, 11, 18)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let sample = Sample::from_naive(ts, 120.0);

        assert_eq!(sample.date_key, NaiveDate::from_ymd_opt(2025, 11, 18).unwrap());
        assert_eq!(sample.timestamp.naive_local(), ts);
    }

    #[test]
    fn test_source_kind_labels() {
        assert_eq!(SourceKind::AppleHealth.to_string(), "Apple Health");
        assert_eq!(SourceKind::Fitbit.label(), "Fitbit");
    }
}
