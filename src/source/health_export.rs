//! Apple Health `export.xml` reader.
//!
//! Exports routinely run to several gigabytes, so the document is never
//! loaded whole. The reader walks XML events one at a time with a single
//! reusable buffer, inspects `<Record>` attributes and forgets the element.
//!
//! Record timestamps carry their own UTC offset (`2025-01-12 19:20:47 -0500`).
//! The window test compares absolute instants and samples are bucketed by
//! their UTC date.

use crate::core::window::TimeWindow;
use crate::diagnostics::IngestStats;
use crate::source::error::SourceError;
use crate::source::types::{IngestOutcome, Sample, SampleSource, SourceKind};
use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// `type` attribute of heart-rate records.
pub const HEART_RATE_TYPE: &str = "HKQuantityTypeIdentifierHeartRate";

/// Timestamp layout used by every date attribute in the export.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Emit a progress line every this many heart-rate records.
const PROGRESS_INTERVAL: u64 = 10_000;

const RECORD_TAG: &[u8] = b"Record";

/// Streaming source over a single Apple Health export document.
#[derive(Debug, Clone)]
pub struct HealthExportSource {
    path: PathBuf,
}

impl HealthExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSource for HealthExportSource {
    fn kind(&self) -> SourceKind {
        SourceKind::AppleHealth
    }

    fn load(&self, window: &TimeWindow) -> Result<IngestOutcome, SourceError> {
        tracing::info!(path = %self.path.display(), %window, "parsing Apple Health export");

        let file = File::open(&self.path).map_err(|e| SourceError::io(&self.path, e))?;
        let mut outcome = read_export(BufReader::new(file), window, &self.path)?;
        outcome.stats.record_file();

        tracing::info!(
            records = outcome.stats.records_seen,
            in_range = outcome.stats.accepted,
            "finished Apple Health export"
        );
        Ok(outcome)
    }
}

/// Heart-rate attributes of one `<Record>` element, still as text.
#[derive(Debug, Default)]
struct RawRecord {
    start: Option<String>,
    end: Option<String>,
    value: Option<String>,
}

/// Outcome of inspecting one `<Record>` element.
enum RecordCheck {
    NotHeartRate,
    Malformed,
    Valid(DateTime<FixedOffset>, f64),
}

/// Stream samples out of an export document.
///
/// `origin` only labels errors.
pub fn read_export<R: BufRead>(
    input: R,
    window: &TimeWindow,
    origin: &Path,
) -> Result<IngestOutcome, SourceError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut outcome = IngestOutcome::default();
    let mut saw_element = false;
    // Open elements, so a truncated export is caught at EOF
    let mut depth: usize = 0;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(quick_xml::Error::Io(e)) => {
                return Err(SourceError::io(
                    origin,
                    std::io::Error::new(e.kind(), e.to_string()),
                ));
            }
            Err(e) => {
                return Err(SourceError::malformed(
                    origin,
                    format!("XML error at byte {}: {e}", reader.buffer_position()),
                ));
            }
        };

        let opens = matches!(event, Event::Start(_));
        match event {
            Event::Start(e) | Event::Empty(e) => {
                if saw_element && depth == 0 {
                    return Err(SourceError::malformed(
                        origin,
                        format!(
                            "unexpected element after the root closed at byte {}",
                            reader.buffer_position()
                        ),
                    ));
                }
                saw_element = true;
                if opens {
                    depth += 1;
                }
                if e.name().as_ref() == RECORD_TAG {
                    handle_record(&e, window, &mut outcome);
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_element {
        return Err(SourceError::malformed(origin, "no XML elements found"));
    }
    if depth > 0 {
        return Err(SourceError::malformed(
            origin,
            format!("document ended with {depth} unclosed element(s), export may be truncated"),
        ));
    }

    Ok(outcome)
}

fn handle_record(element: &BytesStart<'_>, window: &TimeWindow, outcome: &mut IngestOutcome) {
    let (timestamp, heart_rate) = match check_record(element) {
        RecordCheck::NotHeartRate => return,
        RecordCheck::Malformed => {
            outcome.stats.record_malformed();
            report_progress(&outcome.stats);
            return;
        }
        RecordCheck::Valid(timestamp, heart_rate) => (timestamp, heart_rate),
    };

    if window.contains(timestamp) {
        outcome.samples.push(Sample::from_offset(timestamp, heart_rate));
        outcome.stats.record_accepted();
    } else {
        outcome.stats.record_out_of_window();
    }
    report_progress(&outcome.stats);
}

fn check_record(element: &BytesStart<'_>) -> RecordCheck {
    let mut raw = RawRecord::default();
    let mut is_heart_rate = false;
    let mut broken = false;

    for attr in element.attributes() {
        let Ok(attr) = attr else {
            broken = true;
            continue;
        };
        let Ok(value) = attr.unescape_value() else {
            broken = true;
            continue;
        };
        match attr.key.as_ref() {
            b"type" => is_heart_rate = value == HEART_RATE_TYPE,
            b"startDate" => raw.start = Some(value.into_owned()),
            b"endDate" => raw.end = Some(value.into_owned()),
            b"value" => raw.value = Some(value.into_owned()),
            _ => {}
        }
    }

    if !is_heart_rate {
        return RecordCheck::NotHeartRate;
    }
    if broken {
        tracing::debug!("skipping heart rate record with unreadable attributes");
        return RecordCheck::Malformed;
    }

    match parse_raw(&raw) {
        Some((timestamp, heart_rate)) => RecordCheck::Valid(timestamp, heart_rate),
        None => {
            tracing::debug!(?raw, "skipping malformed heart rate record");
            RecordCheck::Malformed
        }
    }
}

fn parse_raw(raw: &RawRecord) -> Option<(DateTime<FixedOffset>, f64)> {
    let start = parse_export_date(raw.start.as_deref()?)?;
    // endDate is required even though only startDate positions the sample
    parse_export_date(raw.end.as_deref()?)?;
    let heart_rate = raw.value.as_deref()?.trim().parse::<f64>().ok()?;
    if !heart_rate.is_finite() {
        return None;
    }
    Some((start, heart_rate))
}

/// Parse an export date attribute such as `2025-01-12 19:20:47 +0000`.
pub fn parse_export_date(input: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

fn report_progress(stats: &IngestStats) {
    if stats.records_seen % PROGRESS_INTERVAL == 0 {
        tracing::info!("Processed {} heart rate records...", stats.records_seen);
    }
}
