//! Configuration for the streaming client.
//!
//! Two files live under the platform directories: the configuration proper
//! (backend address, sampling rate, retention bound) and a small control file
//! through which the `capture` and `save` subcommands reach a running
//! session. The run loop polls both once per second, so edits from another
//! process take effect without restarting.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend host
    pub backend_host: String,

    /// Backend port
    pub backend_port: u16,

    /// ADC sampling rate in Hz; Nyquist is half of this
    pub sampling_rate_hz: f64,

    /// Maximum samples retained in the live window
    pub sample_count: usize,

    /// Backend emit interval in seconds, sent with filter updates
    pub update_interval_secs: f64,

    /// Path for exporting captured snapshots
    pub export_path: PathBuf,

    /// Path for storing control and telemetry files
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adc-scope-client");

        Self {
            backend_host: "127.0.0.1".to_string(),
            backend_port: 5000,
            sampling_rate_hz: 6000.0,
            sample_count: 500,
            update_interval_secs: 0.05,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adc-scope-client")
            .join("config.json")
    }

    /// Path of the control file the run loop polls.
    pub fn control_path(&self) -> PathBuf {
        self.data_path.join("control.json")
    }

    /// Path of the persisted telemetry stats.
    pub fn telemetry_path(&self) -> PathBuf {
        self.data_path.join("telemetry.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Operator requests for a running session.
///
/// Each subcommand bumps a sequence number; the run loop acts when a number
/// advances past the last one it handled. Sequence numbers rather than flags
/// so a request is never lost to a concurrent poll-and-reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Snapshot capture requests issued so far
    pub capture_seq: u64,
    /// Save-to-backend requests issued so far
    pub save_seq: u64,
}

impl ControlState {
    /// Load control state, defaulting to zeroes when the file is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save control state.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Request a snapshot capture.
    pub fn request_capture(&mut self) {
        self.capture_seq += 1;
    }

    /// Request a save of the current window.
    pub fn request_save(&mut self) {
        self.save_seq += 1;
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend_host, "127.0.0.1");
        assert_eq!(config.backend_port, 5000);
        assert_eq!(config.sampling_rate_hz, 6000.0);
        assert_eq!(config.sample_count, 500);
        assert_eq!(config.update_interval_secs, 0.05);
    }

    #[test]
    fn test_control_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.json");

        // Missing file reads as zeroes.
        let mut control = ControlState::load(&path).unwrap();
        assert_eq!(control, ControlState::default());

        control.request_capture();
        control.request_capture();
        control.request_save();
        control.save(&path).unwrap();

        let reloaded = ControlState::load(&path).unwrap();
        assert_eq!(reloaded.capture_seq, 2);
        assert_eq!(reloaded.save_seq, 1);
    }

    #[test]
    fn test_derived_paths() {
        let config = Config {
            data_path: PathBuf::from("/tmp/scope"),
            ..Config::default()
        };
        assert_eq!(config.control_path(), PathBuf::from("/tmp/scope/control.json"));
        assert_eq!(
            config.telemetry_path(),
            PathBuf::from("/tmp/scope/telemetry.json")
        );
    }
}
