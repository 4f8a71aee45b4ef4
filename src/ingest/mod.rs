//! # Ingestion Loop
//!
//! Owns the serial connection lifecycle and drives the telemetry pipeline.
//!
//! This module handles:
//! - The connection state machine (`Open` / `Closed` / `Reconnecting`)
//! - Bounded-latency polling reads off the serial port
//! - Reconnecting with capped exponential backoff after link faults
//! - Parsing, converting, and publishing accepted frames to the hub
//!
//! Failure semantics: malformed frames are dropped with a diagnostic, I/O
//! faults close the port and trigger reconnection, and nothing here is
//! fatal — the loop's only exit is the hub's shutdown signal, checked
//! every iteration so cancellation latency stays within one poll interval.

pub mod framer;

pub use framer::LineFramer;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::frame::{parse_line, FrameSchema, TelemetrySample};
use crate::hub::TelemetryHub;
use crate::serial::{PortConnector, TelemetryPort};

/// Lifecycle of the serial handle, mutated only by the ingest loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Port open, frames flowing
    Open,
    /// Port lost; waiting out the retry backoff
    Closed,
    /// A reopen attempt is in flight
    Reconnecting,
}

/// Timing and conversion parameters for the ingest loop
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Poll interval bounding read and cancellation latency
    pub poll_interval: Duration,
    /// First retry delay after a link fault
    pub reconnect_initial: Duration,
    /// Backoff ceiling (delay doubles up to this)
    pub reconnect_max: Duration,
    /// Sea-level reference pressure for altimetry (Pa)
    pub reference_pressure_pa: f64,
    /// Ground-station reference position for tilt (deg)
    pub reference_latitude: f64,
    pub reference_longitude: f64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_millis(8_000),
            reference_pressure_pa: crate::units::DEFAULT_REFERENCE_PRESSURE_PA,
            reference_latitude: 69.2960,
            reference_longitude: 16.0289,
        }
    }
}

/// Number of accepted frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 100;

/// The telemetry ingestion state machine
///
/// Runs as one tokio task until the hub signals shutdown. Owns the port
/// exclusively; the rest of the process sees telemetry only through the
/// hub's snapshot queries.
pub struct IngestLoop {
    connector: Box<dyn PortConnector>,
    hub: Arc<TelemetryHub>,
    schema: FrameSchema,
    settings: IngestSettings,
}

impl IngestLoop {
    pub fn new(
        connector: Box<dyn PortConnector>,
        hub: Arc<TelemetryHub>,
        schema: FrameSchema,
        settings: IngestSettings,
    ) -> Self {
        Self {
            connector,
            hub,
            schema,
            settings,
        }
    }

    /// Run until the hub's shutdown signal fires
    ///
    /// Poll cycle: reconnect if the port is down, otherwise read whatever
    /// bytes are available within one poll interval and push every
    /// completed line through the pipeline. Read faults close the port and
    /// fall back to the reconnect path; they never propagate.
    pub async fn run(mut self) {
        let mut shutdown = self.hub.shutdown_signal();
        let mut port: Option<Box<dyn TelemetryPort>> = None;
        let mut framer = LineFramer::new();
        let mut backoff = self.settings.reconnect_initial;
        let mut buf = vec![0u8; 1024];
        let mut last_status = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let Some(active) = port.as_mut() else {
                self.hub.set_connection_state(ConnectionState::Reconnecting);
                match self.connector.connect().await {
                    Ok(p) => {
                        port = Some(p);
                        framer.clear();
                        backoff = self.settings.reconnect_initial;
                        self.hub.set_connection_state(ConnectionState::Open);
                        info!("telemetry link open");
                    }
                    Err(e) => {
                        self.hub.set_connection_state(ConnectionState::Closed);
                        debug!("connect failed: {}; retrying in {:?}", e, backoff);
                        tokio::select! {
                            _ = sleep(backoff) => {}
                            _ = shutdown.changed() => {}
                        }
                        backoff = (backoff * 2).min(self.settings.reconnect_max);
                    }
                }
                continue;
            };

            match timeout(self.settings.poll_interval, active.read(&mut buf)).await {
                // Quiet line this poll window; loop back to the shutdown check
                Err(_elapsed) => {}
                Ok(Ok(0)) => {
                    warn!("telemetry link closed by device");
                    port = None;
                    self.hub.set_connection_state(ConnectionState::Closed);
                }
                Ok(Ok(n)) => {
                    for line in framer.push(&buf[..n]) {
                        self.handle_line(&line);
                    }

                    let accepted = self.hub.stats().accepted;
                    if accepted - last_status >= LOG_INTERVAL_FRAMES {
                        let stats = self.hub.stats();
                        info!(
                            "ingested {} frames ({} rejected, {} logged)",
                            stats.accepted, stats.rejected, stats.logged
                        );
                        last_status = accepted;
                    }
                }
                Ok(Err(e)) => {
                    warn!("telemetry read error: {}", e);
                    port = None;
                    self.hub.set_connection_state(ConnectionState::Closed);
                }
            }
        }

        let stats = self.hub.stats();
        info!(
            "ingest loop stopped: {} accepted, {} rejected, {} logged",
            stats.accepted, stats.rejected, stats.logged
        );
    }

    /// Parse, convert, and publish one raw line
    ///
    /// Drops the frame on parse or domain failure; no partial sample ever
    /// reaches the hub.
    fn handle_line(&self, line: &str) {
        let frame = match parse_line(line, &self.schema) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("dropped frame: {}", e);
                self.hub.record_rejected();
                return;
            }
        };

        let sample = match TelemetrySample::from_frame(
            &frame,
            &self.schema,
            self.settings.reference_pressure_pa,
            self.settings.reference_latitude,
            self.settings.reference_longitude,
        ) {
            Ok(sample) => sample,
            Err(e) => {
                debug!("dropped frame: {}", e);
                self.hub.record_rejected();
                return;
            }
        };

        self.hub.accept(&sample, &frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::port_trait::mocks::{MockConnector, ReadStep};
    use crate::store::Channel;
    use std::io;

    const LINE_A: &str = "12.5,58,14:06:14,23.0,69.2960,16.0289,101036,10000,45.0,477,42.0,-70\r";
    const LINE_B: &str = "13.0,59,14:06:15,24.1,69.2961,16.0290,101020,9980,45.1,476,42.0,-71\r";

    fn test_settings() -> IngestSettings {
        IngestSettings {
            poll_interval: Duration::from_millis(5),
            reconnect_initial: Duration::from_millis(1),
            reconnect_max: Duration::from_millis(4),
            ..IngestSettings::default()
        }
    }

    fn test_hub() -> Arc<TelemetryHub> {
        Arc::new(TelemetryHub::new(
            None,
            FrameSchema::new().unwrap().header_line(),
        ))
    }

    fn spawn_loop(hub: &Arc<TelemetryHub>, connector: MockConnector) -> tokio::task::JoinHandle<()> {
        let ingest = IngestLoop::new(
            Box::new(connector),
            Arc::clone(hub),
            FrameSchema::new().unwrap(),
            test_settings(),
        );
        tokio::spawn(ingest.run())
    }

    async fn wait_for_accepted(hub: &TelemetryHub, count: u64) {
        timeout(Duration::from_secs(5), async {
            while hub.stats().accepted < count {
                sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("timed out waiting for frames");
    }

    #[tokio::test]
    async fn test_valid_frames_flow_into_the_hub() {
        let hub = test_hub();
        let connector = MockConnector::new(vec![Ok(vec![
            ReadStep::Data(LINE_A.as_bytes().to_vec()),
            ReadStep::Data(LINE_B.as_bytes().to_vec()),
        ])]);

        assert_eq!(hub.connection_state(), ConnectionState::Closed);

        let task = spawn_loop(&hub, connector);
        wait_for_accepted(&hub, 2).await;
        // Frames arrived, so the loop has reported the link open
        assert_eq!(hub.connection_state(), ConnectionState::Open);
        hub.request_shutdown();
        task.await.unwrap();

        assert_eq!(hub.stats().accepted, 2);
        assert_eq!(hub.snapshot(Channel::Pressure), vec![101_036.0, 101_020.0]);
        assert_eq!(hub.latest_sample().unwrap().sequence_id, 59);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped_without_side_effects() {
        let hub = test_hub();
        let connector = MockConnector::new(vec![Ok(vec![
            ReadStep::Data(b"1,2,3\r".to_vec()),
            ReadStep::Data(LINE_A.as_bytes().to_vec()),
        ])]);

        let task = spawn_loop(&hub, connector);
        wait_for_accepted(&hub, 1).await;
        hub.request_shutdown();
        task.await.unwrap();

        let stats = hub.stats();
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.logged, 0);
        // Only the valid frame reached the rolling store
        assert_eq!(hub.snapshot(Channel::Pressure).len(), 1);
    }

    #[tokio::test]
    async fn test_read_fault_reconnects_without_losing_frames() {
        let hub = test_hub();
        // First port delivers one frame then faults; the reconnect attempt
        // fails once; the third port delivers the second frame.
        let connector = MockConnector::new(vec![
            Ok(vec![
                ReadStep::Data(LINE_A.as_bytes().to_vec()),
                ReadStep::Error(io::ErrorKind::BrokenPipe),
            ]),
            Err(()),
            Ok(vec![ReadStep::Data(LINE_B.as_bytes().to_vec())]),
        ]);
        let attempts = Arc::clone(&connector.attempts);

        let task = spawn_loop(&hub, connector);
        wait_for_accepted(&hub, 2).await;
        hub.request_shutdown();
        task.await.unwrap();

        // No frame lost or duplicated across the fault
        assert_eq!(hub.stats().accepted, 2);
        assert_eq!(hub.snapshot(Channel::Pressure), vec![101_036.0, 101_020.0]);
        // Initial open + failed retry + successful retry
        assert_eq!(*attempts.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_device_eof_is_treated_as_a_fault() {
        let hub = test_hub();
        let connector = MockConnector::new(vec![
            Ok(vec![
                ReadStep::Data(LINE_A.as_bytes().to_vec()),
                ReadStep::Eof,
            ]),
            Ok(vec![ReadStep::Data(LINE_B.as_bytes().to_vec())]),
        ]);

        let task = spawn_loop(&hub, connector);
        wait_for_accepted(&hub, 2).await;
        hub.request_shutdown();
        task.await.unwrap();

        assert_eq!(hub.stats().accepted, 2);
    }

    #[tokio::test]
    async fn test_frame_split_across_reads_still_parses() {
        let (head, tail) = LINE_A.as_bytes().split_at(30);
        let hub = test_hub();
        let connector = MockConnector::new(vec![Ok(vec![
            ReadStep::Data(head.to_vec()),
            ReadStep::Data(tail.to_vec()),
        ])]);

        let task = spawn_loop(&hub, connector);
        wait_for_accepted(&hub, 1).await;
        hub.request_shutdown();
        task.await.unwrap();

        assert_eq!(hub.stats().accepted, 1);
        assert_eq!(hub.stats().rejected, 0);
    }

    #[tokio::test]
    async fn test_shutdown_exits_while_disconnected() {
        let hub = test_hub();
        // Every connect attempt fails; the loop must still honor shutdown
        let connector = MockConnector::new(vec![]);

        let task = spawn_loop(&hub, connector);
        sleep(Duration::from_millis(10)).await;
        hub.request_shutdown();
        timeout(Duration::from_secs(1), task)
            .await
            .expect("loop must exit on shutdown")
            .unwrap();
    }
}
