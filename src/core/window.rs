//! The caller-supplied analysis window.
//!
//! Window bounds are accepted either as `YYYY-MM-DD HH:MM:SS` or as an ISO
//! `YYYY-MM-DDTHH:MM:SSZ` timestamp. Both forms produce a `+00:00` instant.
//! For Apple Health this is read as UTC; for Fitbit it is the same wall clock
//! the device wrote its naive timestamps in.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

const PLAIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// An inclusive `[start, end]` time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First instant included in the analysis
    pub start: DateTime<FixedOffset>,
    /// Last instant included in the analysis
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    /// Create a window, rejecting ranges where `start >= end`.
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::Inverted);
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from caller strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        let start = parse_timestamp(start).map_err(|e| e.for_bound("start"))?;
        let end = parse_timestamp(end).map_err(|e| e.for_bound("end"))?;
        Self::new(start, end)
    }

    /// Check if a timestamp falls within this window (both ends inclusive).
    pub fn contains(&self, timestamp: DateTime<FixedOffset>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Same check for a timezone-naive wall-clock time.
    pub fn contains_naive(&self, timestamp: NaiveDateTime) -> bool {
        self.contains(timestamp.and_utc().fixed_offset())
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M:%S%:z"),
            self.end.format("%Y-%m-%d %H:%M:%S%:z")
        )
    }
}

/// Parse a caller timestamp into a `+00:00` instant.
pub fn parse_timestamp(input: &str) -> Result<DateTime<FixedOffset>, WindowError> {
    let trimmed = input.trim();

    let naive = if trimmed.contains('T') && trimmed.ends_with('Z') {
        NaiveDateTime::parse_from_str(&trimmed[..trimmed.len() - 1], ISO_FORMAT)
    } else {
        NaiveDateTime::parse_from_str(trimmed, PLAIN_FORMAT)
    };

    naive
        .map(|dt| dt.and_utc().fixed_offset())
        .map_err(|e| WindowError::InvalidTimestamp {
            bound: None,
            input: input.to_string(),
            message: e.to_string(),
        })
}

/// Errors building a [`TimeWindow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    InvalidTimestamp {
        bound: Option<&'static str>,
        input: String,
        message: String,
    },
    Inverted,
}

impl WindowError {
    fn for_bound(self, name: &'static str) -> Self {
        match self {
            WindowError::InvalidTimestamp { input, message, .. } => {
                WindowError::InvalidTimestamp {
                    bound: Some(name),
                    input,
                    message,
                }
            }
            other => other,
        }
    }
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::InvalidTimestamp {
                bound,
                input,
                message,
            } => {
                if let Some(bound) = bound {
                    write!(f, "invalid {bound} timestamp {input:?}: {message}")?;
                } else {
                    write!(f, "invalid timestamp {input:?}: {message}")?;
                }
                write!(
                    f,
                    " (use \"YYYY-MM-DD HH:MM:SS\" or \"YYYY-MM-DDTHH:MM:SSZ\")"
                )
            }
            WindowError::Inverted => write!(f, "start timestamp must be before end timestamp"),
        }
    }
}

impl std::error::Error for WindowError {}
