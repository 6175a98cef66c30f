//! Monitor configuration.
//!
//! Defaults match a USB-CDC debug port on a typical EVSE controller board.
//! A JSON file may override any subset of the fields.

use crate::connection::{BaudRate, PortSettings};
use crate::console::DEFAULT_MAX_CHARS;
use crate::error::{Error, Result};
use crate::receiver::ReceiverOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Substring matched against listed port names.
    pub port_pattern: String,
    pub baud_rate: BaudRate,
    pub read_timeout_ms: u64,
    /// Wait between polls that found no input.
    pub poll_interval_ms: u64,
    /// How long stopping the receiver may take before it is abandoned.
    pub shutdown_grace_ms: u64,
    pub console_max_chars: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port_pattern: "usbmodem1421".to_string(),
            baud_rate: BaudRate::default(),
            read_timeout_ms: 400,
            poll_interval_ms: 100,
            shutdown_grace_ms: 1_000,
            console_max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl MonitorConfig {
    /// Load a config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config { path: path.to_path_buf(), reason: e.to_string() })?;
        let config = Self::from_json(&text).map_err(|e| match e {
            Error::MalformedJson(e) => Error::Config { path: path.to_path_buf(), reason: e.to_string() },
            other => other,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse a config document. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Settings for opening `port_name` with this configuration.
    pub fn port_settings(&self, port_name: impl Into<String>) -> PortSettings {
        PortSettings::new(port_name, self.baud_rate).with_read_timeout(Duration::from_millis(self.read_timeout_ms))
    }

    /// Read loop tuning derived from this configuration.
    pub fn receiver_options(&self) -> ReceiverOptions {
        ReceiverOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
            ..ReceiverOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.port_pattern, "usbmodem1421");
        assert_eq!(config.baud_rate.value(), 921_600);
        assert_eq!(config.console_max_chars, 10_000);

        let options = config.receiver_options();
        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert_eq!(options.shutdown_grace, Duration::from_secs(1));

        let settings = config.port_settings("/dev/ttyACM0");
        assert_eq!(settings.read_timeout, Duration::from_millis(400));
        assert_eq!(settings.port_name, "/dev/ttyACM0");
    }

    #[test]
    fn test_partial_override() {
        let config = MonitorConfig::from_json(r#"{"baud_rate": 115200, "poll_interval_ms": 20}"#).unwrap();
        assert_eq!(config.baud_rate.value(), 115_200);
        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(config.read_timeout_ms, 400);
    }

    #[test]
    fn test_rejects_unsupported_baud_rate() {
        assert!(MonitorConfig::from_json(r#"{"baud_rate": 123}"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = MonitorConfig::load(Path::new("/nonexistent/sermon.json")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("sermon-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"port_pattern": "ttyACM"}"#).unwrap();
        let config = MonitorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.port_pattern, "ttyACM");
        assert_eq!(config.baud_rate, BaudRate::default());
    }
}
