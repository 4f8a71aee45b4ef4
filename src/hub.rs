//! # Telemetry Hub
//!
//! The single shared context object between the ingest loop and the
//! display/reporting layer.
//!
//! This module handles:
//! - Owning the rolling store, recording flag, and flight logger
//! - The external control surface (recording, log destination, shutdown)
//! - Read-only snapshot queries for concurrent consumers
//!
//! The hub is the only shared-mutable state in the crate; everything else
//! flows through it. The ingest loop is the sole writer of telemetry data,
//! consumers read via snapshots.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Result;
use crate::frame::{RawFrame, TelemetrySample};
use crate::ingest::ConnectionState;
use crate::logger::FlightLogger;
use crate::store::{Channel, RollingStore};

/// Point-in-time ingest counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Frames that parsed, converted, and were published
    pub accepted: u64,
    /// Frames dropped by the parser or a converter
    pub rejected: u64,
    /// Accepted frames persisted to the flight log
    pub logged: u64,
}

/// Shared context between the ingest loop and external consumers
pub struct TelemetryHub {
    store: RollingStore,
    recording: AtomicBool,
    logger: Mutex<FlightLogger>,
    connection: RwLock<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    accepted: AtomicU64,
    rejected: AtomicU64,
    logged: AtomicU64,
}

impl TelemetryHub {
    /// Create a hub with an unarmed logger and recording off
    ///
    /// # Arguments
    ///
    /// * `max_samples` - Optional per-channel rolling-buffer capacity
    /// * `log_header` - Header row for fresh flight-log files
    pub fn new(max_samples: Option<usize>, log_header: String) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store: RollingStore::new(max_samples),
            recording: AtomicBool::new(false),
            logger: Mutex::new(FlightLogger::new(log_header)),
            connection: RwLock::new(ConnectionState::Closed),
            shutdown_tx,
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            logged: AtomicU64::new(0),
        }
    }

    /// Publish one accepted frame: rolling buffers, latest sample, and —
    /// when recording is on and a destination is armed — the flight log
    ///
    /// A flight-log fault is surfaced as a warning and pauses persistence
    /// (the logger retries its open on the next append); it never stops
    /// ingestion.
    pub fn accept(&self, sample: &TelemetrySample, frame: &RawFrame) {
        self.store.publish(sample);
        self.accepted.fetch_add(1, Ordering::Relaxed);

        if self.recording.load(Ordering::Relaxed) {
            let mut logger = self.logger.lock().unwrap();
            match logger.append(frame) {
                Ok(true) => {
                    self.logged.fetch_add(1, Ordering::Relaxed);
                }
                Ok(false) => {} // recording on but no destination designated yet
                Err(e) => {
                    warn!("flight log fault, recording paused: {}", e);
                }
            }
        }
    }

    /// Count a dropped frame (parse or domain failure)
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish the serial link's lifecycle state
    ///
    /// Only the ingest loop calls this; consumers read it through
    /// [`connection_state`](Self::connection_state).
    pub(crate) fn set_connection_state(&self, state: ConnectionState) {
        *self.connection.write().unwrap() = state;
    }

    // --- External control surface ---

    /// Toggle recording; has no effect on rolling-store updates
    pub fn set_recording(&self, on: bool) {
        self.recording.store(on, Ordering::Relaxed);
        info!("recording {}", if on { "started" } else { "stopped" });
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    /// Designate the flight-log destination file
    ///
    /// # Errors
    ///
    /// Returns `Logger` error if the file cannot be opened.
    pub fn set_log_destination<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.logger.lock().unwrap().set_destination(path)
    }

    /// Ask the ingest loop to exit after its current iteration
    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// A receiver the ingest loop watches for cancellation
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    // --- Read-only queries ---

    /// Point-in-time copy of one channel's rolling buffer
    pub fn snapshot(&self, channel: Channel) -> Vec<f64> {
        self.store.snapshot(channel)
    }

    /// Point-in-time copy of the GPS position track
    pub fn position_track(&self) -> Vec<(f64, f64)> {
        self.store.position_track()
    }

    /// The most recently accepted sample, if any
    pub fn latest_sample(&self) -> Option<TelemetrySample> {
        self.store.latest()
    }

    /// Serial connection state as last reported by the ingest loop
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.read().unwrap()
    }

    /// Current ingest counters
    pub fn stats(&self) -> IngestStats {
        IngestStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            logged: self.logged.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{parse_line, FrameSchema};
    use crate::units::DEFAULT_REFERENCE_PRESSURE_PA;
    use tempfile::tempdir;

    const LINE: &str = "12.5,58,14:06:14,23.0,69.2960,16.0289,101036,10000,45.0,477,42.0,-70";

    fn hub() -> TelemetryHub {
        TelemetryHub::new(None, FrameSchema::new().unwrap().header_line())
    }

    fn accepted_frame() -> (TelemetrySample, RawFrame) {
        let schema = FrameSchema::new().unwrap();
        let frame = parse_line(LINE, &schema).unwrap();
        let sample = TelemetrySample::from_frame(
            &frame,
            &schema,
            DEFAULT_REFERENCE_PRESSURE_PA,
            69.296,
            16.0289,
        )
        .unwrap();
        (sample, frame)
    }

    #[test]
    fn test_recording_without_destination_writes_nothing() {
        let hub = hub();
        let (sample, frame) = accepted_frame();

        hub.set_recording(true);
        hub.accept(&sample, &frame);

        let stats = hub.stats();
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.logged, 0);
        // The rolling store still got the sample
        assert_eq!(hub.snapshot(Channel::Pressure).len(), 1);
    }

    #[test]
    fn test_destination_then_recording_logs_in_arrival_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flight.csv");

        let hub = hub();
        let (sample, frame) = accepted_frame();

        hub.set_log_destination(&path).unwrap();
        hub.set_recording(true);
        hub.accept(&sample, &frame);
        hub.accept(&sample, &frame);

        assert_eq!(hub.stats().logged, 2);
        let contents = std::fs::read_to_string(&path).unwrap();
        // Header + two records, in order
        assert_eq!(contents.lines().count(), 3);
        assert_eq!(contents.lines().nth(1).unwrap(), LINE);
    }

    #[test]
    fn test_recording_off_gates_the_logger_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flight.csv");

        let hub = hub();
        let (sample, frame) = accepted_frame();

        hub.set_log_destination(&path).unwrap();
        hub.accept(&sample, &frame);

        assert_eq!(hub.stats().logged, 0);
        assert_eq!(hub.latest_sample().unwrap().sequence_id, 58);
    }

    #[test]
    fn test_shutdown_signal_reaches_subscribers() {
        let hub = hub();
        let rx = hub.shutdown_signal();
        assert!(!*rx.borrow());
        hub.request_shutdown();
        assert!(*rx.borrow());
    }

    #[test]
    fn test_connection_state_starts_closed_and_tracks_updates() {
        let hub = hub();
        assert_eq!(hub.connection_state(), ConnectionState::Closed);
        hub.set_connection_state(ConnectionState::Open);
        assert_eq!(hub.connection_state(), ConnectionState::Open);
    }

    #[test]
    fn test_rejected_frames_are_counted() {
        let hub = hub();
        hub.record_rejected();
        hub.record_rejected();
        assert_eq!(hub.stats().rejected, 2);
        assert_eq!(hub.stats().accepted, 0);
    }
}
