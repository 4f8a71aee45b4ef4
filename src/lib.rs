//! # CanSat Link Library
//!
//! Ground-station telemetry ingestion for a high-altitude balloon CanSat
//! payload.
//!
//! This library reads comma-separated telemetry frames from the receiver's
//! serial port, validates and converts them into physical quantities, keeps
//! rolling buffers for live display, and persists accepted frames to an
//! append-only flight log.

pub mod config;
pub mod error;
pub mod frame;
pub mod hub;
pub mod ingest;
pub mod logger;
pub mod serial;
pub mod store;
pub mod units;
