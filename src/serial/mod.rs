//! # Serial Communication Module
//!
//! Handles the serial link to the CanSat receiver radio.
//!
//! This module handles:
//! - Opening the receiver's serial port at the configured baud rate
//! - Auto-detecting the device across a list of candidate paths
//! - The async port abstraction the ingest loop reads through

pub mod port_trait;

pub use port_trait::{PortConnector, TelemetryPort, TokioTelemetryPort};

use crate::error::{CansatLinkError, Result};
use async_trait::async_trait;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Default receiver device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices (Teensy receiver)
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Default baud rate of the receiver radio link
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Open the first serial port that responds among the candidate paths
///
/// # Arguments
///
/// * `paths` - Device paths to try (e.g. `["/dev/ttyACM0"]`)
/// * `baud_rate` - Link baud rate (8N1, no flow control)
///
/// # Returns
///
/// * `Result<SerialStream>` - Opened serial port
///
/// # Errors
///
/// Returns `SerialPortNotFound` listing the tried paths if none opens.
pub fn open_first_available(paths: &[String], baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    for path in paths {
        debug!("trying to open serial port: {}", path);

        match open_port(path, baud_rate) {
            Ok(port) => {
                info!("opened receiver at {} ({} baud)", path, baud_rate);
                return Ok(port);
            }
            Err(e) => {
                warn!("failed to open {}: {}", path, e);
                continue;
            }
        }
    }

    Err(CansatLinkError::SerialPortNotFound(paths.join(", ")))
}

/// Open a specific serial port with the receiver's settings
fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    let port = tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| CansatLinkError::Serial(format!("failed to open {}: {}", path, e)))?;

    Ok(port)
}

/// Production connector: opens the configured device paths on demand
///
/// The ingest loop reconnects through this after a link fault; each
/// attempt re-probes the path list so the receiver can come back on a
/// different device node.
pub struct SerialConnector {
    paths: Vec<String>,
    baud_rate: u32,
}

impl SerialConnector {
    pub fn new(paths: Vec<String>, baud_rate: u32) -> Self {
        Self { paths, baud_rate }
    }
}

#[async_trait]
impl PortConnector for SerialConnector {
    async fn connect(&mut self) -> Result<Box<dyn TelemetryPort>> {
        let port = open_first_available(&self.paths, self.baud_rate)?;
        Ok(Box::new(TokioTelemetryPort::new(port)))
    }
}
