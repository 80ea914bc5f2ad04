//! Configuration for the heart-rate threshold analyzer.
//!
//! Defaults can be persisted to `config.json` in the platform config
//! directory; command-line flags always win over the file.

use crate::core::attribution::AttributionPolicy;
use crate::source::fitbit::DEFAULT_MIN_CONFIDENCE;
use crate::source::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default threshold in beats per minute.
pub const DEFAULT_MIN_BPM: u32 = 140;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Heart rate at or above which time is counted
    pub min_bpm: u32,

    /// Gaps longer than this between a qualifying reading and the next are reported
    #[serde(with = "duration_serde")]
    pub large_gap_threshold: Duration,

    /// Apple Health export settings
    pub apple_health: AppleHealthConfig,

    /// Fitbit export settings
    pub fitbit: FitbitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_bpm: DEFAULT_MIN_BPM,
            large_gap_threshold: Duration::from_secs(60),
            apple_health: AppleHealthConfig::default(),
            fitbit: FitbitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hr-threshold-minutes")
            .join("config.json")
    }

    /// Reject policies that would credit negative or undefined time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, policy) in [
            ("apple_health", &self.apple_health.policy),
            ("fitbit", &self.fitbit.policy),
        ] {
            if !(policy.fallback_seconds.is_finite() && policy.fallback_seconds >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name}.policy.fallback_seconds must be a non-negative number"
                )));
            }
            if let Some(cap) = policy.cap_seconds {
                if !(cap.is_finite() && cap >= 0.0) {
                    return Err(ConfigError::Invalid(format!(
                        "{name}.policy.cap_seconds must be a non-negative number"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Apple Health export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleHealthConfig {
    /// Path to `export.xml`
    pub xml_file: PathBuf,
    pub policy: AttributionPolicy,
}

impl Default for AppleHealthConfig {
    fn default() -> Self {
        Self {
            xml_file: PathBuf::from("export.xml"),
            policy: AttributionPolicy::for_source(SourceKind::AppleHealth),
        }
    }
}

/// Fitbit export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitbitConfig {
    /// Directory holding `heart_rate-*.json` files
    pub exports_dir: PathBuf,
    /// Minimum reading confidence (0-3)
    pub min_confidence: i64,
    pub policy: AttributionPolicy,
}

impl Default for FitbitConfig {
    fn default() -> Self {
        Self {
            exports_dir: PathBuf::from("exports"),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            policy: AttributionPolicy::for_source(SourceKind::Fitbit),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.min_bpm, 140);
        assert_eq!(config.large_gap_threshold, Duration::from_secs(60));
        assert_eq!(config.apple_health.policy.cap_seconds, Some(10.0));
        assert_eq!(config.apple_health.policy.fallback_seconds, 5.0);
        assert_eq!(config.fitbit.policy.cap_seconds, None);
        assert_eq!(config.fitbit.policy.fallback_seconds, 3.0);
        assert_eq!(config.fitbit.min_confidence, 1);
        assert_eq!(
            config.fitbit.policy,
            AttributionPolicy::for_source(SourceKind::Fitbit)
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.min_bpm = 155;
        config.fitbit.policy.cap_seconds = Some(30.0);
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"min_bpm": 150, "fitbit": {"min_confidence": 2}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.min_bpm, 150);
        assert_eq!(config.fitbit.min_confidence, 2);
        assert_eq!(config.fitbit.policy, AttributionPolicy::FITBIT);
        assert_eq!(config.apple_health, AppleHealthConfig::default());
    }

    #[test]
    fn test_negative_fallback_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"apple_health": {"policy": {"cap_seconds": 10.0, "fallback_seconds": -1.0}}}"#,
        )
        .unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
