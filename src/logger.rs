//! # Durable Flight Logger
//!
//! Append-only persistence of accepted raw frames.
//!
//! This module handles:
//! - Opening the designated log file in append mode
//! - Writing one comma-separated record per accepted frame
//! - A header row on a fresh file
//! - Flushing every record (durability over throughput)
//!
//! Records persist the wire fields verbatim, `id` included, so the offline
//! analysis can re-sort by sequence id without trusting arrival order.
//! Telemetry arrives at roughly one frame per tens of milliseconds, so the
//! synchronous flush-per-record write on the ingest task is cheap.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CansatLinkError, Result};
use crate::frame::RawFrame;

/// Append-only CSV logger for accepted telemetry frames
///
/// Unarmed until a destination is designated; the file handle is held open
/// for the recording session. A failed write drops the handle and the next
/// append retries the open, so a transient disk fault pauses recording
/// instead of killing ingestion.
pub struct FlightLogger {
    destination: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    header: String,
    records_written: u64,
}

impl FlightLogger {
    /// Create an unarmed logger
    ///
    /// # Arguments
    ///
    /// * `header` - Comma-separated column names, written once to a fresh
    ///   file (from [`FrameSchema::header_line`](crate::frame::FrameSchema::header_line))
    pub fn new(header: String) -> Self {
        Self {
            destination: None,
            writer: None,
            header,
            records_written: 0,
        }
    }

    /// Designate the log destination and open it
    ///
    /// Creates the file if missing and writes the header row when the file
    /// is empty. Replaces any previously designated destination.
    ///
    /// # Errors
    ///
    /// Returns `Logger` error if the file cannot be opened or the header
    /// cannot be written.
    pub fn set_destination<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.writer = None;
        self.destination = Some(path.clone());
        self.open_writer()?;
        info!("flight log destination set to {}", path.display());
        Ok(())
    }

    /// Drop the destination; subsequent appends become no-ops
    pub fn clear_destination(&mut self) {
        self.destination = None;
        self.writer = None;
    }

    /// Whether a destination has been designated
    pub fn is_armed(&self) -> bool {
        self.destination.is_some()
    }

    /// Records written since the logger was created
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Append one accepted frame as a log record
    ///
    /// Returns `Ok(false)` without touching disk when no destination is
    /// designated. Flushes before returning so the record survives a crash
    /// immediately after acceptance.
    ///
    /// # Errors
    ///
    /// Returns `Logger` error on a write failure; the handle is dropped
    /// and the next append retries the open.
    pub fn append(&mut self, frame: &RawFrame) -> Result<bool> {
        if self.destination.is_none() {
            return Ok(false);
        }

        if self.writer.is_none() {
            self.open_writer()?;
        }

        let writer = self.writer.as_mut().ok_or_else(|| {
            CansatLinkError::Logger("flight log writer unavailable".to_string())
        })?;

        let write_result = writeln!(writer, "{}", frame.to_record()).and_then(|_| writer.flush());
        if let Err(e) = write_result {
            self.writer = None;
            return Err(CansatLinkError::Logger(format!(
                "failed to append record: {}",
                e
            )));
        }

        self.records_written += 1;
        debug!("logged frame ({} records total)", self.records_written);
        Ok(true)
    }

    fn open_writer(&mut self) -> Result<()> {
        let path = self.destination.as_ref().ok_or_else(|| {
            CansatLinkError::Logger("no flight log destination designated".to_string())
        })?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                CansatLinkError::Logger(format!("failed to open {}: {}", path.display(), e))
            })?;

        let is_fresh = file
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(false);

        let mut writer = BufWriter::new(file);
        if is_fresh {
            writeln!(writer, "{}", self.header)
                .and_then(|_| writer.flush())
                .map_err(|e| {
                    CansatLinkError::Logger(format!(
                        "failed to write header to {}: {}",
                        path.display(),
                        e
                    ))
                })?;
        }

        self.writer = Some(writer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{parse_line, FrameSchema};
    use tempfile::tempdir;

    const LINE_A: &str = "12.5,58,14:06:14,23.0,69.2960,16.0289,101036,10000,45.0,477,42.0,-70";
    const LINE_B: &str = "13.0,59,14:06:15,24.1,69.2961,16.0290,101020,9980,45.1,476,42.0,-71";

    fn frame(line: &str) -> RawFrame {
        parse_line(line, &FrameSchema::new().unwrap()).unwrap()
    }

    fn logger() -> FlightLogger {
        FlightLogger::new(FrameSchema::new().unwrap().header_line())
    }

    #[test]
    fn test_append_without_destination_is_a_noop() {
        let mut logger = logger();
        let written = logger.append(&frame(LINE_A)).unwrap();
        assert!(!written);
        assert_eq!(logger.records_written(), 0);
    }

    #[test]
    fn test_records_append_in_order_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flight.csv");

        let mut logger = logger();
        logger.set_destination(&path).unwrap();
        assert!(logger.append(&frame(LINE_A)).unwrap());
        assert!(logger.append(&frame(LINE_B)).unwrap());

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "elapsed_time,id,time,alt,lat,lng,pressure,ohm,hum,co2,temp,rssi"
        );
        assert_eq!(lines[1], LINE_A);
        assert_eq!(lines[2], LINE_B);
    }

    #[test]
    fn test_each_record_is_flushed_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flight.csv");

        let mut logger = logger();
        logger.set_destination(&path).unwrap();
        logger.append(&frame(LINE_A)).unwrap();

        // Read back while the writer is still alive: the record must
        // already be on disk
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(LINE_A));
    }

    #[test]
    fn test_existing_file_gets_no_second_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flight.csv");

        let mut first = logger();
        first.set_destination(&path).unwrap();
        first.append(&frame(LINE_A)).unwrap();
        drop(first);

        // A new session appending to the same file must not repeat the header
        let mut second = logger();
        second.set_destination(&path).unwrap();
        second.append(&frame(LINE_B)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let headers = contents
            .lines()
            .filter(|l| l.starts_with("elapsed_time"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_unwritable_destination_is_a_logger_error() {
        let mut logger = logger();
        let result = logger.set_destination("/nonexistent-dir/flight.csv");
        assert!(matches!(result, Err(CansatLinkError::Logger(_))));
    }

    #[test]
    fn test_clear_destination_disarms() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flight.csv");

        let mut logger = logger();
        logger.set_destination(&path).unwrap();
        logger.clear_destination();
        assert!(!logger.is_armed());
        assert!(!logger.append(&frame(LINE_A)).unwrap());
    }
}
