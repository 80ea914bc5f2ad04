//! Fitbit per-day heart-rate export reader.
//!
//! A Fitbit data export holds one `heart_rate-YYYY-MM-DD.json` file per day,
//! each a JSON array of readings:
//!
//! ```json
//! [{"dateTime": "11/18/25 23:00:00", "value": {"bpm": 72, "confidence": 2}}]
//! ```
//!
//! Files are small enough to parse whole. Timestamps have no zone; they are
//! compared against the window as wall-clock times and bucketed by their own
//! calendar date. Callers must give the window in the same local time the
//! device recorded in.

use crate::core::window::TimeWindow;
use crate::diagnostics::IngestStats;
use crate::source::error::SourceError;
use crate::source::types::{IngestOutcome, Sample, SampleSource, SourceKind};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Filename pattern of the daily heart-rate files.
pub const FILE_PATTERN: &str = "heart_rate-*.json";

/// Timestamp layout of the `dateTime` field.
pub const DATE_FORMAT: &str = "%m/%d/%y %H:%M:%S";

/// Readings below this confidence (on Fitbit's 0-3 scale) are dropped.
pub const DEFAULT_MIN_CONFIDENCE: i64 = 1;

/// Source over a directory of Fitbit daily heart-rate files.
#[derive(Debug, Clone)]
pub struct FitbitExportSource {
    dir: PathBuf,
    min_confidence: i64,
}

impl FitbitExportSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: i64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// All heart-rate files in the directory, in path order.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>, SourceError> {
        let pattern = glob::Pattern::new(FILE_PATTERN)
            .map_err(|e| SourceError::malformed(&self.dir, e.msg))?;

        if !self.dir.is_dir() {
            if self.dir.exists() {
                return Err(SourceError::Io {
                    path: self.dir.clone(),
                    message: "not a directory".to_string(),
                });
            }
            return Err(SourceError::NotFound(self.dir.clone()));
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| SourceError::io(&self.dir, e))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| pattern.matches(n))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn load_file(
        &self,
        path: &Path,
        window: &TimeWindow,
        outcome: &mut IngestOutcome,
    ) -> Result<(), SourceError> {
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| SourceError::malformed(path, e))?;

        let mut stats = IngestStats::new();
        stats.record_file();

        for entry in entries {
            let Some(reading) = Reading::from_value(entry) else {
                stats.record_malformed();
                continue;
            };

            if !window.contains_naive(reading.timestamp) {
                stats.record_out_of_window();
                continue;
            }

            if reading.confidence < self.min_confidence {
                stats.record_low_confidence();
                continue;
            }

            outcome
                .samples
                .push(Sample::from_naive(reading.timestamp, reading.bpm));
            stats.record_accepted();
        }

        tracing::info!(
            file = %display_name(path),
            loaded = stats.accepted,
            skipped = stats.skipped(),
            "loaded Fitbit file"
        );
        outcome.stats.merge(&stats);
        Ok(())
    }
}

impl SampleSource for FitbitExportSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Fitbit
    }

    fn load(&self, window: &TimeWindow) -> Result<IngestOutcome, SourceError> {
        let files = self.discover_files()?;
        let mut outcome = IngestOutcome::default();

        if files.is_empty() {
            tracing::warn!(dir = %self.dir.display(), "no heart rate files found");
            return Ok(outcome);
        }
        tracing::info!(count = files.len(), "found Fitbit heart rate files");

        for path in &files {
            self.load_file(path, window, &mut outcome)?;
        }

        tracing::info!(total = outcome.samples.len(), "total Fitbit records loaded");
        Ok(outcome)
    }
}

/// On-disk shape of one reading.
#[derive(Debug, Deserialize)]
struct RawReading {
    #[serde(rename = "dateTime")]
    date_time: String,
    value: RawValue,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    bpm: f64,
    #[serde(default)]
    confidence: i64,
}

/// A reading whose fields all parsed.
#[derive(Debug, Clone, PartialEq)]
struct Reading {
    timestamp: NaiveDateTime,
    bpm: f64,
    confidence: i64,
}

impl Reading {
    fn from_value(value: serde_json::Value) -> Option<Self> {
        let raw: RawReading = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed Fitbit reading");
                return None;
            }
        };
        let timestamp = parse_fitbit_date(&raw.date_time)?;
        Some(Self {
            timestamp,
            bpm: raw.value.bpm,
            confidence: raw.value.confidence,
        })
    }
}

/// Parse a `dateTime` value such as `11/18/25 23:00:00`.
pub fn parse_fitbit_date(input: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_parse_fitbit_date() {
        let ts = parse_fitbit_date("11/18/25 23:00:00").unwrap();
        assert_eq!(
            ts,
            NaiveDate::from_ymd_opt(2025, 11, 18)
                .unwrap()
                .and_hms_opt(23, 0, 0)
                .unwrap()
        );
        assert!(parse_fitbit_date("2025-11-18 23:00:00").is_none());
    }

    #[test]
    fn test_reading_defaults_missing_confidence() {
        let reading =
            Reading::from_value(json!({"dateTime": "11/18/25 23:00:00", "value": {"bpm": 151}}))
                .unwrap();
        assert_eq!(reading.confidence, 0);
        assert_eq!(reading.bpm, 151.0);
    }

    #[test]
    fn test_reading_rejects_bad_entries() {
        assert!(Reading::from_value(json!({"dateTime": "11/18/25 23:00:00"})).is_none());
        assert!(Reading::from_value(
            json!({"dateTime": "11/18/25 23:00:00", "value": {"bpm": "fast"}})
        )
        .is_none());
        assert!(Reading::from_value(json!({"dateTime": "tomorrow", "value": {"bpm": 80}})).is_none());
        assert!(Reading::from_value(json!("not an object")).is_none());
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let source = FitbitExportSource::new("/definitely/not/here/exports");
        let window = TimeWindow::parse("2025-11-18 00:00:00", "2025-11-19 00:00:00").unwrap();
        assert!(matches!(
            source.load(&window),
            Err(SourceError::NotFound(_))
        ));
    }
}
