//! # Error Types
//!
//! Custom error types for CanSat Link using `thiserror`.

use thiserror::Error;

/// Main error type for CanSat Link
#[derive(Debug, Error)]
pub enum CansatLinkError {
    /// Malformed or short telemetry frame; the frame is dropped
    #[error("frame parse error: {0}")]
    Parse(String),

    /// Non-physical input to a unit converter (e.g. non-positive resistance)
    #[error("domain error: {0}")]
    Domain(String),

    /// Serial port I/O errors
    #[error("serial error: {0}")]
    Serial(String),

    /// No serial device could be opened at any of the configured paths
    #[error("no telemetry device found at: {0}")]
    SerialPortNotFound(String),

    /// Flight log write failures; recording is paused, ingestion continues
    #[error("flight log error: {0}")]
    Logger(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CanSat Link
pub type Result<T> = std::result::Result<T, CansatLinkError>;
