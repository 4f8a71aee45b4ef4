//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

use crate::error::Result;

/// Trait for the read side of a telemetry serial port
#[async_trait]
pub trait TelemetryPort: Send {
    /// Read available bytes into `buf`, returning the byte count
    ///
    /// `Ok(0)` means the device went away (EOF); the ingest loop treats it
    /// like an I/O fault and reconnects.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Trait for (re)opening a telemetry port
///
/// The ingest loop owns a connector rather than a port so reconnecting
/// after a link fault goes through the same path as the initial open.
#[async_trait]
pub trait PortConnector: Send {
    async fn connect(&mut self) -> Result<Box<dyn TelemetryPort>>;
}

/// Wrapper around tokio_serial::SerialStream that implements TelemetryPort
pub struct TokioTelemetryPort {
    port: tokio_serial::SerialStream,
}

impl TokioTelemetryPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl TelemetryPort for TokioTelemetryPort {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.port.read(buf).await
    }
}
