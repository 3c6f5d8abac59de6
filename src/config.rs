//! Configuration loading for the handrig binary.
//!
//! Tuning values live in a TOML file under the platform config directory
//! (`<config>/handrig/config.toml`). Every section defaults to the values
//! the hand rig was tuned with, so a missing file is normal on first run.
//! The 12 animation parameter names and the point-index channel name are
//! code constants, not configuration; renaming them breaks external
//! contracts.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::adapter::{OVERLAY_RAMP_RATE, TRIGGER_SMOOTH_TIMESCALE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct HandrigConfig {
    pub controller: ControllerConfig,
    pub adapter: AdapterConfig,
    pub session: SessionConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Deadzone for the analog trigger axes, as a fraction.
    pub trigger_deadzone: f32,

    /// Device poll interval in microseconds.
    pub poll_interval_us: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            trigger_deadzone: 0.05,
            poll_interval_us: 500,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AdapterConfig {
    /// Trigger smoothing timescale in seconds.
    pub trigger_smooth_timescale: f32,

    /// Overlay alpha ramp rate per second.
    pub overlay_ramp_rate: f32,

    /// Frame tick interval in milliseconds.
    pub frame_interval_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            trigger_smooth_timescale: TRIGGER_SMOOTH_TIMESCALE,
            overlay_ramp_rate: OVERLAY_RAMP_RATE,
            frame_interval_ms: 16,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Identity of the local avatar session, used to filter broadcasts.
    pub session_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: "local-avatar".to_string(),
        }
    }
}

impl HandrigConfig {
    /// Default location of the config file, if the platform exposes one.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("handrig").join("config.toml"))
    }

    /// Loads the config from the default location, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::load_from(&path)
            }
            Some(path) => {
                info!(
                    "No config file at {}, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                debug!("No platform config directory, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        debug!("Parsed config: {:?}", config);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rig_tuning() {
        let config = HandrigConfig::default();
        assert_eq!(config.adapter.trigger_smooth_timescale, 0.1);
        assert_eq!(config.adapter.overlay_ramp_rate, 8.0);
        assert_eq!(config.adapter.frame_interval_ms, 16);
        assert_eq!(config.controller.trigger_deadzone, 0.05);
        assert_eq!(config.session.session_id, "local-avatar");
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = HandrigConfig::default();
        config.session.session_id = "avatar-42".to_string();
        config.adapter.frame_interval_ms = 8;
        config.save_to(&path).expect("save");

        let loaded = HandrigConfig::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[session]\nsession_id = \"avatar-7\"\n").expect("write");

        let loaded = HandrigConfig::load_from(&path).expect("load");
        assert_eq!(loaded.session.session_id, "avatar-7");
        assert_eq!(loaded.adapter, AdapterConfig::default());
        assert_eq!(loaded.controller, ControllerConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not toml = = =").expect("write");

        assert!(matches!(
            HandrigConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
