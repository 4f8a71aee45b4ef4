//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::ingest::IngestSettings;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub buffers: BufferConfig,

    #[serde(default)]
    pub altimetry: AltimetryConfig,

    #[serde(default)]
    pub ground_station: GroundStationConfig,

    #[serde(default)]
    pub recording: RecordingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_ports")]
    pub ports: Vec<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

/// Rolling buffer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BufferConfig {
    /// Per-channel capacity; 0 keeps the full flight unbounded
    #[serde(default)]
    pub max_samples: usize,
}

/// Altimetry model configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AltimetryConfig {
    /// Sea-level reference pressure (Pa); 101036 was measured at launch,
    /// 101325 is the standard atmosphere
    #[serde(default = "default_reference_pressure_pa")]
    pub reference_pressure_pa: f64,
}

/// Ground-station reference position (used for the tilt angle)
#[derive(Debug, Deserialize, Clone)]
pub struct GroundStationConfig {
    #[serde(default = "default_gs_latitude")]
    pub latitude: f64,

    #[serde(default = "default_gs_longitude")]
    pub longitude: f64,
}

/// Flight-log recording configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RecordingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Designate a timestamped log file and start recording at launch of
    /// the binary (the GUI's save-then-record flow, automated)
    #[serde(default)]
    pub auto_start: bool,
}

// Default value functions
fn default_ports() -> Vec<String> {
    crate::serial::DEFAULT_DEVICE_PATHS
        .iter()
        .map(|p| p.to_string())
        .collect()
}
fn default_baud_rate() -> u32 { crate::serial::DEFAULT_BAUD_RATE }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_reconnect_initial_ms() -> u64 { 500 }
fn default_reconnect_max_ms() -> u64 { 8000 }

fn default_reference_pressure_pa() -> f64 { crate::units::DEFAULT_REFERENCE_PRESSURE_PA }

// Andøya launch site
fn default_gs_latitude() -> f64 { 69.2960 }
fn default_gs_longitude() -> f64 { 16.0289 }

fn default_log_dir() -> String { "./logs".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            ports: default_ports(),
            baud_rate: default_baud_rate(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { max_samples: 0 }
    }
}

impl Default for AltimetryConfig {
    fn default() -> Self {
        Self { reference_pressure_pa: default_reference_pressure_pa() }
    }
}

impl Default for GroundStationConfig {
    fn default() -> Self {
        Self {
            latitude: default_gs_latitude(),
            longitude: default_gs_longitude(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            auto_start: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.serial.ports.is_empty() {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("serial ports list cannot be empty")
            ));
        }

        if self.serial.baud_rate == 0 {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("baud_rate must be greater than 0")
            ));
        }

        if self.serial.poll_interval_ms == 0 || self.serial.poll_interval_ms > 1000 {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("poll_interval_ms must be between 1 and 1000")
            ));
        }

        if self.serial.reconnect_initial_ms == 0 || self.serial.reconnect_initial_ms > 60000 {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("reconnect_initial_ms must be between 1 and 60000")
            ));
        }

        if self.serial.reconnect_max_ms < self.serial.reconnect_initial_ms {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("reconnect_max_ms must be >= reconnect_initial_ms")
            ));
        }

        if self.altimetry.reference_pressure_pa <= 0.0 {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("reference_pressure_pa must be positive")
            ));
        }

        if self.ground_station.latitude.abs() > 90.0 {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("ground station latitude must be within ±90")
            ));
        }

        if self.ground_station.longitude.abs() > 180.0 {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("ground station longitude must be within ±180")
            ));
        }

        if self.recording.auto_start && self.recording.log_dir.is_empty() {
            return Err(crate::error::CansatLinkError::Config(
                toml::de::Error::custom("log_dir cannot be empty when auto_start is on")
            ));
        }

        Ok(())
    }

    /// Rolling-buffer capacity; `None` means unbounded
    pub fn max_samples(&self) -> Option<usize> {
        (self.buffers.max_samples > 0).then_some(self.buffers.max_samples)
    }

    /// Ingest loop settings derived from this configuration
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            poll_interval: Duration::from_millis(self.serial.poll_interval_ms),
            reconnect_initial: Duration::from_millis(self.serial.reconnect_initial_ms),
            reconnect_max: Duration::from_millis(self.serial.reconnect_max_ms),
            reference_pressure_pa: self.altimetry.reference_pressure_pa,
            reference_latitude: self.ground_station.latitude,
            reference_longitude: self.ground_station.longitude,
        }
    }
}
