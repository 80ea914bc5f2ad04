//! Per-day report of minutes at or above the threshold.

use crate::core::attribution::DailyMinutes;
use crate::core::window::TimeWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Output format for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Minutes for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMinutes {
    pub date: NaiveDate,
    pub minutes: f64,
}

/// Summary of a [`DailyMinutes`] map over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub window: TimeWindow,
    pub min_bpm: f64,
    /// Days in ascending date order
    pub days: Vec<DayMinutes>,
    pub total_minutes: f64,
    pub day_count: usize,
    /// Absent when no day has any minutes
    pub average_minutes: Option<f64>,
}

impl DailyReport {
    pub fn new(daily: &DailyMinutes, window: &TimeWindow, min_bpm: f64) -> Self {
        let days: Vec<DayMinutes> = daily
            .iter()
            .map(|(date, minutes)| DayMinutes {
                date: *date,
                minutes: *minutes,
            })
            .collect();

        let total_minutes = days.iter().map(|d| d.minutes).sum::<f64>();
        let day_count = days.len();
        let average_minutes = if day_count > 0 {
            Some(total_minutes / day_count as f64)
        } else {
            None
        };

        Self {
            window: *window,
            min_bpm,
            days,
            total_minutes,
            day_count,
            average_minutes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Render in the requested format.
    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.render_json(),
        }
    }

    /// Console layout: one line per day, then totals and the daily average.
    pub fn render_text(&self) -> String {
        let threshold = format_bpm(self.min_bpm);

        if self.is_empty() {
            return format!(
                "No time >= {threshold} BPM found between {} and {}",
                self.window.start.format("%Y-%m-%d %H:%M:%S"),
                self.window.end.format("%Y-%m-%d %H:%M:%S")
            );
        }

        let rule = "=".repeat(55);
        let mut lines = vec![
            format!("Daily Minutes at {threshold}+ BPM (ALL time above threshold):"),
            rule.clone(),
        ];
        lines.extend(
            self.days
                .iter()
                .map(|day| format!("{}: {:.1} minutes", day.date.format("%Y-%m-%d"), day.minutes)),
        );
        lines.push(rule);
        lines.push(format!("Total days with {threshold}+ BPM: {}", self.day_count));
        lines.push(format!(
            "Total minutes at {threshold}+ BPM: {:.1}",
            self.total_minutes
        ));
        if let Some(average) = self.average_minutes {
            lines.push(format!("Average minutes per day: {average:.1}"));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for DailyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render_text())
    }
}

/// Whole thresholds print without a decimal point.
fn format_bpm(bpm: f64) -> String {
    if bpm.fract() == 0.0 {
        format!("{bpm:.0}")
    } else {
        format!("{bpm}")
    }
}
