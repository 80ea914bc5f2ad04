//! Duration attribution: turning point readings into minutes above a threshold.
//!
//! Every qualifying reading is credited with the time until the next reading
//! in the series. Sources differ only in how that interval is bounded:
//!
//! - an optional cap keeps sparse stretches from inflating the estimate
//! - a fallback interval is used for the final reading, which has no successor
//!
//! Both knobs live in [`AttributionPolicy`] so the algorithm itself is shared.

use crate::source::types::{Sample, SourceKind};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minutes at or above threshold, keyed by calendar date.
pub type DailyMinutes = BTreeMap<NaiveDate, f64>;

/// Raw gaps longer than this are reported as [`LargeGap`]s by default.
pub const DEFAULT_LARGE_GAP_SECS: f64 = 60.0;

/// How a reading's interval is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributionPolicy {
    /// Upper bound on the seconds credited to one reading, if any
    pub cap_seconds: Option<f64>,
    /// Seconds credited to the last reading in the series
    pub fallback_seconds: f64,
}

impl AttributionPolicy {
    /// Apple Watch samples densely during workouts, so long gaps are noise.
    pub const APPLE_HEALTH: AttributionPolicy = AttributionPolicy {
        cap_seconds: Some(10.0),
        fallback_seconds: 5.0,
    };

    /// Fitbit gaps are meaningful and used as-is.
    pub const FITBIT: AttributionPolicy = AttributionPolicy {
        cap_seconds: None,
        fallback_seconds: 3.0,
    };

    /// Default policy for a platform.
    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::AppleHealth => Self::APPLE_HEALTH,
            SourceKind::Fitbit => Self::FITBIT,
        }
    }

    /// Seconds credited for a raw gap to the next reading.
    pub fn bound(&self, gap_seconds: f64) -> f64 {
        match self.cap_seconds {
            Some(cap) => gap_seconds.min(cap),
            None => gap_seconds,
        }
    }
}

/// A qualifying reading followed by an unusually long silence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeGap {
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
    /// Uncapped seconds between the two readings
    pub gap_seconds: f64,
    pub from_bpm: f64,
    pub to_bpm: f64,
}

/// Result of one attribution pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Minutes per date; only dates with qualifying readings appear
    pub daily_minutes: DailyMinutes,
    /// Readings at or above the threshold
    pub qualifying_samples: usize,
    /// Seconds credited across all dates
    pub total_seconds: f64,
    /// Qualifying readings whose next reading came much later
    pub large_gaps: Vec<LargeGap>,
}

impl Attribution {
    pub fn total_minutes(&self) -> f64 {
        self.total_seconds / 60.0
    }

    pub fn is_empty(&self) -> bool {
        self.daily_minutes.is_empty()
    }
}

/// Attribute time at or above `min_bpm` to each calendar date.
///
/// The input is left untouched; a sorted copy of references is used. Readings
/// with equal timestamps keep their input order.
pub fn attribute(samples: &[Sample], min_bpm: f64, policy: &AttributionPolicy) -> Attribution {
    attribute_with_gap_threshold(samples, min_bpm, policy, DEFAULT_LARGE_GAP_SECS)
}

/// [`attribute`] with an explicit threshold for [`LargeGap`] reporting.
pub fn attribute_with_gap_threshold(
    samples: &[Sample],
    min_bpm: f64,
    policy: &AttributionPolicy,
    large_gap_secs: f64,
) -> Attribution {
    let mut result = Attribution::default();
    if samples.is_empty() {
        return result;
    }

    let mut sorted: Vec<&Sample> = samples.iter().collect();
    sorted.sort_by_key(|s| s.timestamp);

    for (i, sample) in sorted.iter().enumerate() {
        if sample.heart_rate < min_bpm {
            continue;
        }
        result.qualifying_samples += 1;

        let seconds = match sorted.get(i + 1) {
            Some(next) => {
                let gap = seconds_between(sample.timestamp, next.timestamp);
                if gap > large_gap_secs {
                    result.large_gaps.push(LargeGap {
                        from: sample.timestamp,
                        to: next.timestamp,
                        gap_seconds: gap,
                        from_bpm: sample.heart_rate,
                        to_bpm: next.heart_rate,
                    });
                }
                policy.bound(gap)
            }
            None => policy.fallback_seconds,
        };

        result.total_seconds += seconds;
        *result.daily_minutes.entry(sample.date_key).or_insert(0.0) += seconds / 60.0;
    }

    tracing::debug!(
        samples = samples.len(),
        qualifying = result.qualifying_samples,
        total_seconds = result.total_seconds,
        "attribution complete"
    );

    result
}

fn seconds_between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2025, 11, 12, 8, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    fn sample_at(offset_secs: i64, bpm: f64) -> Sample {
        Sample::from_offset(t0() + Duration::seconds(offset_secs), bpm)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn three_readings() -> Vec<Sample> {
        vec![sample_at(0, 150.0), sample_at(2, 150.0), sample_at(90, 150.0)]
    }

    #[test]
    fn test_empty_series_yields_empty_map() {
        let result = attribute(&[], 140.0, &AttributionPolicy::APPLE_HEALTH);
        assert!(result.is_empty());
        assert_eq!(result.qualifying_samples, 0);
        assert_eq!(result.total_seconds, 0.0);
    }

    #[test]
    fn test_capped_policy_scenario() {
        let result = attribute(&three_readings(), 140.0, &AttributionPolicy::APPLE_HEALTH);

        // 2 + min(88, 10) + 5 fallback
        assert_eq!(result.total_seconds, 17.0);
        assert_eq!(result.qualifying_samples, 3);
        assert_eq!(result.daily_minutes.len(), 1);
        assert!((result.daily_minutes[&day(12)] - 17.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_uncapped_policy_scenario() {
        let result = attribute(&three_readings(), 140.0, &AttributionPolicy::FITBIT);

        // 2 + 88 + 3 fallback
        assert_eq!(result.total_seconds, 93.0);
        assert!((result.total_minutes() - 1.55).abs() < 1e-9);
        assert!((result.daily_minutes[&day(12)] - 1.55).abs() < 1e-9);
    }

    #[test]
    fn test_single_qualifying_sample_gets_fallback_only() {
        let samples = vec![sample_at(0, 160.0)];

        let apple = attribute(&samples, 140.0, &AttributionPolicy::APPLE_HEALTH);
        assert_eq!(apple.total_seconds, 5.0);

        let fitbit = attribute(&samples, 140.0, &AttributionPolicy::FITBIT);
        assert_eq!(fitbit.total_seconds, 3.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let samples = vec![sample_at(0, 140.0), sample_at(4, 139.0), sample_at(8, 139.0)];

        let result = attribute(&samples, 140.0, &AttributionPolicy::FITBIT);
        assert_eq!(result.qualifying_samples, 1);
        assert_eq!(result.total_seconds, 4.0);
    }

    #[test]
    fn test_all_below_threshold_yields_empty_map() {
        let samples = vec![sample_at(0, 100.0), sample_at(5, 120.0)];
        let result = attribute(&samples, 140.0, &AttributionPolicy::APPLE_HEALTH);

        assert!(result.is_empty());
        assert_eq!(result.total_seconds, 0.0);
    }

    #[test]
    fn test_below_threshold_successor_still_bounds_interval() {
        // The high reading is credited up to the next reading, whatever its value
        let samples = vec![sample_at(0, 150.0), sample_at(6, 90.0)];
        let result = attribute(&samples, 140.0, &AttributionPolicy::APPLE_HEALTH);

        assert_eq!(result.total_seconds, 6.0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut shuffled = three_readings();
        shuffled.reverse();

        let sorted = attribute(&three_readings(), 140.0, &AttributionPolicy::APPLE_HEALTH);
        let reversed = attribute(&shuffled, 140.0, &AttributionPolicy::APPLE_HEALTH);
        assert_eq!(sorted.daily_minutes, reversed.daily_minutes);
        assert_eq!(sorted.total_seconds, reversed.total_seconds);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let mut samples = three_readings();
        samples.reverse();
        let before = samples.clone();

        let first = attribute(&samples, 140.0, &AttributionPolicy::FITBIT);
        let second = attribute(&samples, 140.0, &AttributionPolicy::FITBIT);

        assert_eq!(samples, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_minutes_split_across_dates() {
        let late = Utc.with_ymd_and_hms(2025, 11, 12, 23, 59, 58)
            .unwrap()
            .fixed_offset();
        let samples = vec![
            Sample::from_offset(late, 150.0),
            Sample::from_offset(late + Duration::seconds(4), 150.0),
        ];
        let result = attribute(&samples, 140.0, &AttributionPolicy::FITBIT);

        // The first reading is credited to its own date even though its
        // interval crosses midnight
        assert!((result.daily_minutes[&day(12)] - 4.0 / 60.0).abs() < 1e-9);
        assert!((result.daily_minutes[&day(13)] - 3.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_large_gaps_use_raw_interval() {
        let samples = vec![sample_at(0, 150.0), sample_at(200, 130.0), sample_at(205, 150.0)];
        let result = attribute(&samples, 140.0, &AttributionPolicy::APPLE_HEALTH);

        assert_eq!(result.large_gaps.len(), 1);
        let gap = &result.large_gaps[0];
        assert_eq!(gap.gap_seconds, 200.0);
        assert_eq!(gap.from_bpm, 150.0);
        assert_eq!(gap.to_bpm, 130.0);
        // The credited time is still capped
        assert_eq!(result.total_seconds, 15.0);
    }

    #[test]
    fn test_custom_gap_threshold() {
        let result = attribute_with_gap_threshold(
            &three_readings(),
            140.0,
            &AttributionPolicy::FITBIT,
            1.0,
        );
        assert_eq!(result.large_gaps.len(), 2);
    }

    #[test]
    fn test_policy_for_source() {
        assert_eq!(
            AttributionPolicy::for_source(SourceKind::AppleHealth),
            AttributionPolicy::APPLE_HEALTH
        );
        assert_eq!(AttributionPolicy::for_source(SourceKind::Fitbit).cap_seconds, None);
        assert_eq!(AttributionPolicy::APPLE_HEALTH.bound(88.0), 10.0);
        assert_eq!(AttributionPolicy::FITBIT.bound(88.0), 88.0);
    }
}
