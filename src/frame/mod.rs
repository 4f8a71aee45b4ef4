//! # Telemetry Frame Module
//!
//! Turns raw serial lines into validated telemetry records.
//!
//! This module handles:
//! - The positional wire schema (field order and types)
//! - Parsing and validating one comma-separated line
//! - Deriving physical quantities into an immutable [`TelemetrySample`]

pub mod parser;
pub mod sample;
pub mod schema;

pub use parser::{parse_line, RawFrame};
pub use sample::TelemetrySample;
pub use schema::{FieldKind, FrameSchema};
