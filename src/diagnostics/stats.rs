//! Ingestion counters.
//!
//! Every record an adapter looks at lands in exactly one bucket, so
//! `records_seen == accepted + malformed + out_of_window + low_confidence`.

use serde::{Deserialize, Serialize};

/// What happened to the records of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Files opened (1 for a single export document)
    pub files_read: u64,
    /// Heart-rate records inspected
    pub records_seen: u64,
    /// Records that became samples
    pub accepted: u64,
    /// Records missing fields or with unparsable values
    pub malformed: u64,
    /// Valid records outside the requested window
    pub out_of_window: u64,
    /// Valid in-window records dropped for low sensor confidence
    pub low_confidence: u64,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file(&mut self) {
        self.files_read += 1;
    }

    pub fn record_accepted(&mut self) {
        self.records_seen += 1;
        self.accepted += 1;
    }

    pub fn record_malformed(&mut self) {
        self.records_seen += 1;
        self.malformed += 1;
    }

    pub fn record_out_of_window(&mut self) {
        self.records_seen += 1;
        self.out_of_window += 1;
    }

    pub fn record_low_confidence(&mut self) {
        self.records_seen += 1;
        self.low_confidence += 1;
    }

    /// Records that were not turned into samples.
    pub fn skipped(&self) -> u64 {
        self.records_seen - self.accepted
    }

    /// Fold another run's counters into this one.
    pub fn merge(&mut self, other: &IngestStats) {
        self.files_read += other.files_read;
        self.records_seen += other.records_seen;
        self.accepted += other.accepted;
        self.malformed += other.malformed;
        self.out_of_window += other.out_of_window;
        self.low_confidence += other.low_confidence;
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "Ingestion Statistics:\n\
             - Files read: {}\n\
             - Heart rate records seen: {}\n\
             - Records in time range: {}\n\
             - Skipped (outside range): {}\n\
             - Skipped (malformed): {}\n\
             - Skipped (low confidence): {}",
            self.files_read,
            self.records_seen,
            self.accepted,
            self.out_of_window,
            self.malformed,
            self.low_confidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let mut stats = IngestStats::new();
        stats.record_accepted();
        stats.record_accepted();
        stats.record_malformed();
        stats.record_out_of_window();
        stats.record_low_confidence();

        assert_eq!(stats.records_seen, 5);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.skipped(), 3);
    }

    #[test]
    fn test_merge() {
        let mut total = IngestStats::new();
        let mut day = IngestStats::new();
        day.record_file();
        day.record_accepted();
        day.record_low_confidence();

        total.merge(&day);
        total.merge(&day);

        assert_eq!(total.files_read, 2);
        assert_eq!(total.records_seen, 4);
        assert_eq!(total.low_confidence, 2);
    }

    #[test]
    fn test_summary_format() {
        let summary = IngestStats::new().summary();
        assert!(summary.contains("Heart rate records seen: 0"));
        assert!(summary.contains("Skipped (malformed)"));
    }
}
