//! Runtime settings for the monitor
//!
//! Settings come from an optional YAML file. A missing file is not an
//! error: every key falls back to its default. A file that exists but
//! cannot be read or parsed aborts startup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Default config file path used by the CLI
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Largest accepted value for any duration key (100 years)
pub const MAX_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// Thresholds and optional features of the monitor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Seconds to sleep between cycles (also the retry interval after a list failure)
    #[serde(default = "default_sleep")]
    pub sleep: u64,

    /// Seconds a node must stay not-ready before it is kicked out
    #[serde(default = "default_kickout")]
    pub kickout: u64,

    /// Seconds a node must stay ready before it is kicked back in
    #[serde(default = "default_kickin")]
    pub kickin: u64,

    /// Port for the /metrics and /healthz endpoints; disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Emit Kubernetes Events on kickout/kickin
    #[serde(default = "default_emit_events")]
    pub emit_events: bool,
}

fn default_sleep() -> u64 {
    10
}

fn default_kickout() -> u64 {
    60
}

fn default_kickin() -> u64 {
    60
}

fn default_emit_events() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sleep: default_sleep(),
            kickout: default_kickout(),
            kickin: default_kickin(),
            metrics_port: None,
            emit_events: default_emit_events(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, using defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let settings = Self::default();
            debug!(
                config = %path.display(),
                sleep = settings.sleep,
                kickout = settings.kickout,
                kickin = settings.kickin,
                "Could not find config file, using the default config values"
            );
            return Ok(settings);
        }

        debug!(config = %path.display(), "Found config file");
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&contents).map_err(|source| Error::ConfigParseError {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject durations too large to subtract from the current time
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("sleep", self.sleep),
            ("kickout", self.kickout),
            ("kickin", self.kickin),
        ] {
            if value > MAX_SECONDS {
                return Err(Error::ConfigError(format!(
                    "{} must be at most {} seconds, got {}",
                    key, MAX_SECONDS, value
                )));
            }
        }
        Ok(())
    }

    /// Parse settings from a YAML document; an empty document yields defaults
    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Poll interval between cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sleep)
    }

    /// Minimum not-ready duration before isolation
    pub fn kickout_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.kickout.min(MAX_SECONDS) as i64)
    }

    /// Minimum ready duration before restoration
    pub fn kickin_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.kickin.min(MAX_SECONDS) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sleep, 10);
        assert_eq!(settings.kickout, 60);
        assert_eq!(settings.kickin, 60);
        assert_eq!(settings.metrics_port, None);
        assert!(settings.emit_events);
        assert_eq!(settings.poll_interval(), Duration::from_secs(10));
        assert_eq!(settings.kickout_delay(), chrono::Duration::seconds(60));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings = Settings::from_yaml("kickout: 120\nsleep: 5\n").unwrap();
        assert_eq!(settings.sleep, 5);
        assert_eq!(settings.kickout, 120);
        assert_eq!(settings.kickin, 60);
    }

    #[test]
    fn test_optional_features() {
        let settings = Settings::from_yaml("metricsPort: 9090\nemitEvents: false\n").unwrap();
        assert_eq!(settings.metrics_port, Some(9090));
        assert!(!settings.emit_events);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(Settings::from_yaml("kickout: soon").is_err());
        assert!(Settings::from_yaml("sleep: -5").is_err());
        assert!(Settings::from_yaml("[not, a, map]").is_err());
    }

    #[test]
    fn test_out_of_range_delays_are_rejected() {
        for yaml in [
            "kickout: 9000000000000",
            "kickin: 9000000000000",
            "sleep: 9000000000000",
            "kickout: 18446744073709551615",
        ] {
            let settings = Settings::from_yaml(yaml).unwrap();
            let err = settings.validate().unwrap_err();
            assert!(matches!(err, Error::ConfigError(_)), "{}", yaml);
            assert!(!err.is_retriable());
        }

        let at_limit = Settings {
            kickout: MAX_SECONDS,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_delays_never_go_negative() {
        let settings = Settings {
            kickout: u64::MAX,
            kickin: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            settings.kickout_delay(),
            chrono::Duration::seconds(MAX_SECONDS as i64)
        );
        assert!(settings.kickin_delay() > chrono::Duration::zero());
    }

    #[test]
    fn test_load_rejects_out_of_range_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "kickout: 9000000000000").unwrap();

        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "kickin: [1, 2").unwrap();

        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParseError { .. }));
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_load_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sleep: 3\nkickout: 30\nkickin: 90").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.sleep, 3);
        assert_eq!(settings.kickout, 30);
        assert_eq!(settings.kickin, 90);
    }
}
