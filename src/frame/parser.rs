//! # Frame Parser
//!
//! Validates one raw serial line against the wire schema.
//!
//! The parser never panics and never raises into the ingest loop: every
//! failure mode is a [`CansatLinkError::Parse`] value and the offending
//! frame is dropped by the caller. A frame that passes produces a
//! [`RawFrame`] whose validated fields back exactly one
//! [`TelemetrySample`](crate::frame::TelemetrySample) — partial frames are
//! never admitted.

use crate::error::{CansatLinkError, Result};
use crate::frame::schema::{FieldKind, FrameSchema};

/// One validated wire frame: the ordered textual fields of a serial line
///
/// Fields are kept verbatim so the durable log can persist exactly what
/// the radio delivered (offline analysis re-sorts by the `id` column and
/// must see it untouched).
#[derive(Debug, Clone)]
pub struct RawFrame {
    fields: Vec<String>,
}

impl RawFrame {
    /// Field at a schema index
    ///
    /// Indices come from [`FrameSchema`]; arity was checked at parse time,
    /// so lookups through schema indices cannot miss.
    pub fn field(&self, index: usize) -> &str {
        &self.fields[index]
    }

    /// All fields in wire order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Re-serialize the frame as one comma-separated log record
    pub fn to_record(&self) -> String {
        self.fields.join(",")
    }
}

/// Parse and validate one raw serial line
///
/// Splits on `,` and checks that (a) the field count matches the schema's
/// arity exactly and (b) every numeric field parses as its declared kind.
/// The line is expected to already be stripped of its CR terminator; stray
/// whitespace around fields is trimmed.
///
/// # Arguments
///
/// * `line` - One raw text line from the serial port
/// * `schema` - The positional wire schema
///
/// # Returns
///
/// * `Result<RawFrame>` - Validated frame, or `Parse` error
///
/// # Errors
///
/// Returns `Parse` error if the line is empty, has the wrong number of
/// fields, or any numeric field fails to parse.
pub fn parse_line(line: &str, schema: &FrameSchema) -> Result<RawFrame> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CansatLinkError::Parse("empty line".to_string()));
    }

    let fields: Vec<String> = trimmed.split(',').map(|f| f.trim().to_string()).collect();

    // Exact arity: an over-long line is as malformed as a short one, and
    // admitting it would persist extra columns under the canonical header
    if fields.len() != schema.field_count() {
        return Err(CansatLinkError::Parse(format!(
            "expected {} fields, got {}: {:?}",
            schema.field_count(),
            fields.len(),
            trimmed
        )));
    }

    for (spec, value) in schema.fields().iter().zip(fields.iter()) {
        match spec.kind {
            FieldKind::Text => {}
            FieldKind::Integer => {
                if value.parse::<u64>().is_err() {
                    return Err(CansatLinkError::Parse(format!(
                        "field '{}' is not an integer: {:?}",
                        spec.name, value
                    )));
                }
            }
            FieldKind::Float => {
                match value.parse::<f64>() {
                    Ok(v) if v.is_finite() => {}
                    _ => {
                        return Err(CansatLinkError::Parse(format!(
                            "field '{}' is not a finite number: {:?}",
                            spec.name, value
                        )));
                    }
                }
            }
        }
    }

    Ok(RawFrame { fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_LINE: &str = "12.5,58,14:06:14,23.0,69.2960,16.0289,101036,10000,45.0,477,42.0,-70";

    fn schema() -> FrameSchema {
        FrameSchema::new().unwrap()
    }

    #[test]
    fn test_valid_line_parses() {
        let frame = parse_line(VALID_LINE, &schema()).unwrap();
        assert_eq!(frame.fields().len(), 12);
        assert_eq!(frame.field(schema().sequence_id), "58");
        assert_eq!(frame.field(schema().pressure), "101036");
        assert_eq!(frame.field(schema().rssi), "-70");
    }

    #[test]
    fn test_short_line_is_rejected() {
        let result = parse_line("12.5,58,14:06:14", &schema());
        assert!(matches!(result, Err(CansatLinkError::Parse(_))));
    }

    #[test]
    fn test_overlong_line_is_rejected() {
        // A 13th field would not fit under the 12-column log header
        let line = format!("{},999", VALID_LINE);
        let result = parse_line(&line, &schema());
        assert!(matches!(result, Err(CansatLinkError::Parse(_))));
    }

    #[test]
    fn test_empty_line_is_rejected() {
        assert!(parse_line("", &schema()).is_err());
        assert!(parse_line("   \r\n", &schema()).is_err());
    }

    #[test]
    fn test_non_numeric_float_field_is_rejected() {
        let line = "12.5,58,14:06:14,23.0,69.2960,16.0289,garbage,10000,45.0,477,42.0,-70";
        let result = parse_line(line, &schema());
        assert!(matches!(result, Err(CansatLinkError::Parse(_))));
    }

    #[test]
    fn test_non_integer_sequence_id_is_rejected() {
        let line = "12.5,abc,14:06:14,23.0,69.2960,16.0289,101036,10000,45.0,477,42.0,-70";
        assert!(parse_line(line, &schema()).is_err());
    }

    #[test]
    fn test_nan_float_field_is_rejected() {
        let line = "12.5,58,14:06:14,NaN,69.2960,16.0289,101036,10000,45.0,477,42.0,-70";
        assert!(parse_line(line, &schema()).is_err());
    }

    #[test]
    fn test_whitespace_around_fields_is_trimmed() {
        let line = " 12.5, 58 ,14:06:14,23.0,69.2960,16.0289,101036,10000,45.0,477,42.0, -70 ";
        let frame = parse_line(line, &schema()).unwrap();
        assert_eq!(frame.field(schema().sequence_id), "58");
        assert_eq!(frame.field(schema().rssi), "-70");
    }

    #[test]
    fn test_record_round_trips_field_order() {
        let frame = parse_line(VALID_LINE, &schema()).unwrap();
        assert_eq!(frame.to_record(), VALID_LINE);
    }
}
