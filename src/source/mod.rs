//! Export adapters.
//!
//! Each platform export is read by its own [`SampleSource`] implementation
//! and reduced to the shared [`Sample`] shape:
//!
//! - [`HealthExportSource`] streams a single Apple Health `export.xml`
//! - [`FitbitExportSource`] reads a directory of Fitbit daily JSON files

pub mod error;
pub mod fitbit;
pub mod health_export;
pub mod types;

// Re-export commonly used types
pub use error::SourceError;
pub use fitbit::FitbitExportSource;
pub use health_export::HealthExportSource;
pub use types::{IngestOutcome, Sample, SampleSource, SourceKind};
