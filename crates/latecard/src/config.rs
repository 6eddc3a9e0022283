//! Configuration management for latecard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scan::CameraFacing;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "latecard";

/// Default roster database file name.
const ROSTER_FILE_NAME: &str = "roster.db";

/// Default teacher-preference file name.
const PREFS_FILE_NAME: &str = "teacher.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LATECARD_`)
/// 2. TOML config file at `~/.config/latecard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera and decode-loop configuration.
    pub camera: CameraConfig,
    /// Roster storage configuration.
    pub roster: RosterConfig,
    /// Submission endpoint configuration.
    pub submission: SubmissionConfig,
    /// Station-local configuration.
    pub station: StationConfig,
}

/// Camera and decode-loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Logical facing preference for device selection.
    pub facing: CameraFacing,
    /// Decode attempts per second while the session is running.
    pub attempts_per_second: u32,
    /// Side length in pixels of the centered square detection region.
    pub scan_box: u32,
}

/// Roster storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Path to the roster database file.
    /// Defaults to `~/.local/share/latecard/roster.db`
    pub database_path: Option<PathBuf>,
}

/// Submission endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// URL of the remote record endpoint. Submission is disabled when unset.
    pub endpoint: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Treat a 2xx response with an unparseable body as delivered.
    ///
    /// The remote spreadsheet script is known to return non-JSON bodies on
    /// success; strict stations can disable this to surface those responses
    /// as failures instead.
    pub assume_success_on_unparseable: bool,
}

/// Station-local configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Teachers offered for the responsible-teacher field.
    pub teachers: Vec<String>,
    /// Path to the default-teacher preference file.
    /// Defaults to `~/.local/share/latecard/teacher.json`
    pub prefs_path: Option<PathBuf>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Rear,
            attempts_per_second: 10,
            scan_box: 250,
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 10,
            assume_success_on_unparseable: true,
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            teachers: default_teachers(),
            prefs_path: None,
        }
    }
}

/// Default teacher choices, matching the station's original roster.
fn default_teachers() -> Vec<String> {
    vec![
        "Yamamoto".to_string(),
        "Sato".to_string(),
        "Suzuki".to_string(),
        "Takahashi".to_string(),
    ]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `LATECARD_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("LATECARD_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.camera.attempts_per_second == 0 {
            return Err(Error::ConfigValidation {
                message: "attempts_per_second must be greater than 0".to_string(),
            });
        }

        if self.camera.scan_box == 0 {
            return Err(Error::ConfigValidation {
                message: "scan_box must be greater than 0".to_string(),
            });
        }

        if self.submission.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if let Some(endpoint) = &self.submission.endpoint {
            if url::Url::parse(endpoint).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("invalid submission endpoint URL: {endpoint}"),
                });
            }
        }

        Ok(())
    }

    /// Get the roster database path, resolving defaults if not set.
    #[must_use]
    pub fn roster_path(&self) -> PathBuf {
        self.roster
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(ROSTER_FILE_NAME))
    }

    /// Get the teacher-preference file path, resolving defaults if not set.
    #[must_use]
    pub fn prefs_path(&self) -> PathBuf {
        self.station
            .prefs_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(PREFS_FILE_NAME))
    }

    /// Get the decode-loop tick interval.
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.camera.attempts_per_second.max(1)))
    }

    /// Get the submission timeout.
    #[must_use]
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission.timeout_secs)
    }
}
