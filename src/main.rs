//! # CanSat Link
//!
//! Ground-station telemetry ingestion for a high-altitude balloon CanSat
//! payload.
//!
//! Reads the receiver's serial port, parses telemetry frames, derives
//! physical quantities, and serves rolling buffers plus an append-only
//! flight log to downstream consumers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::time::{interval, Duration};
use tracing::info;

mod config;
mod error;
mod frame;
mod hub;
mod ingest;
mod logger;
mod serial;
mod store;
mod units;

use config::Config;
use frame::FrameSchema;
use hub::TelemetryHub;
use ingest::IngestLoop;
use serial::SerialConnector;

/// Seconds between latest-sample status log lines
const STATUS_INTERVAL_SECS: u64 = 5;

/// Main entry point for CanSat Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (path from argv, defaults otherwise)
///    - Optionally arm a timestamped flight log and start recording
///    - Spawn the ingestion loop as its own task
///
/// 2. **Main Loop**
///    - Log the latest accepted sample every few seconds
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Signal the ingestion loop and join it before any handle is
///      released, so no write lands after shutdown begins
///    - Log session totals
///
/// # Errors
///
/// Returns error if the configuration fails to load or the flight log
/// destination cannot be created. Serial faults never terminate the
/// process; the ingestion loop reconnects on its own.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("CanSat Link v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => {
            info!("no configuration file given, using defaults");
            Config::default()
        }
    };

    let schema = FrameSchema::new()?;
    let hub = Arc::new(TelemetryHub::new(config.max_samples(), schema.header_line()));

    if config.recording.auto_start {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        let destination = Path::new(&config.recording.log_dir).join(format!("flight_{}.csv", stamp));
        std::fs::create_dir_all(&config.recording.log_dir)?;
        hub.set_log_destination(&destination)?;
        hub.set_recording(true);
    }

    let connector = SerialConnector::new(config.serial.ports.clone(), config.serial.baud_rate);
    let ingest = IngestLoop::new(
        Box::new(connector),
        Arc::clone(&hub),
        schema,
        config.ingest_settings(),
    );
    let ingest_task = tokio::spawn(ingest.run());

    info!("ingestion running, press Ctrl+C to exit");

    let mut status_interval = interval(Duration::from_secs(STATUS_INTERVAL_SECS));
    status_interval.tick().await; // the first tick fires immediately

    // Main status loop
    loop {
        tokio::select! {
            _ = status_interval.tick() => {
                if let Some(sample) = hub.latest_sample() {
                    info!(
                        "latest: seq {} at {} | {:.0} m, {:.0} Pa, {:.1} °C ext, {:.0} ppm CO2, rssi {}",
                        sample.sequence_id,
                        sample.timestamp,
                        sample.barometric_altitude,
                        sample.pressure,
                        sample.external_temp,
                        sample.co2,
                        sample.rssi,
                    );
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    // Signal, then join before releasing anything: no write happens after
    // shutdown begins
    hub.request_shutdown();
    ingest_task.await?;

    let stats = hub.stats();
    info!(
        "session complete: {} frames accepted, {} rejected, {} logged",
        stats.accepted, stats.rejected, stats.logged
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_interval_constant() {
        // A status line every few seconds is readable at 1 frame per tens
        // of milliseconds
        assert_eq!(STATUS_INTERVAL_SECS, 5);
    }
}
