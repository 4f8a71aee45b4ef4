//! # Wire Schema
//!
//! The positional field mapping for the telemetry wire format.
//!
//! The device emits ASCII lines of comma-separated fields terminated by a
//! carriage return. Field order is fixed by the firmware; this table is the
//! single place that order is written down. Parsing and persistence both go
//! through it, so a firmware field reorder is a one-file change.

use crate::error::{CansatLinkError, Result};

/// How a field must parse during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Kept verbatim, no numeric constraint (e.g. timestamps, RSSI)
    Text,
    /// Must parse as an unsigned integer (the frame counter)
    Integer,
    /// Must parse as a finite float
    Float,
}

/// One field of the wire format
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Column name, matching the persisted log header
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Canonical wire schema: the richer of the two firmware variants
///
/// `elapsed_time,id,time,alt,lat,lng,pressure,ohm,hum,co2,temp,rssi`
const CANONICAL_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "elapsed_time", kind: FieldKind::Text },
    FieldSpec { name: "id", kind: FieldKind::Integer },
    FieldSpec { name: "time", kind: FieldKind::Text },
    FieldSpec { name: "alt", kind: FieldKind::Float },
    FieldSpec { name: "lat", kind: FieldKind::Float },
    FieldSpec { name: "lng", kind: FieldKind::Float },
    FieldSpec { name: "pressure", kind: FieldKind::Float },
    FieldSpec { name: "ohm", kind: FieldKind::Float },
    FieldSpec { name: "hum", kind: FieldKind::Float },
    FieldSpec { name: "co2", kind: FieldKind::Float },
    FieldSpec { name: "temp", kind: FieldKind::Float },
    FieldSpec { name: "rssi", kind: FieldKind::Text },
];

/// Positional mapping table for the telemetry wire format
///
/// Holds the ordered field list plus named indices for every field the
/// sample builder reads. Constructed once at startup; [`FrameSchema::new`]
/// checks the indices against the field list so a mismatched edit fails
/// fast instead of silently mis-mapping columns.
#[derive(Debug, Clone)]
pub struct FrameSchema {
    fields: &'static [FieldSpec],
    pub elapsed_time: usize,
    pub sequence_id: usize,
    pub timestamp: usize,
    pub gps_altitude: usize,
    pub latitude: usize,
    pub longitude: usize,
    pub pressure: usize,
    pub thermistor_ohms: usize,
    pub humidity: usize,
    pub co2: usize,
    pub internal_temp: usize,
    pub rssi: usize,
}

impl FrameSchema {
    /// Build and validate the canonical schema
    ///
    /// # Errors
    ///
    /// Returns `Parse` error if a named index falls outside the field
    /// table or points at a field of the wrong kind.
    pub fn new() -> Result<Self> {
        let schema = Self {
            fields: CANONICAL_FIELDS,
            elapsed_time: 0,
            sequence_id: 1,
            timestamp: 2,
            gps_altitude: 3,
            latitude: 4,
            longitude: 5,
            pressure: 6,
            thermistor_ohms: 7,
            humidity: 8,
            co2: 9,
            internal_temp: 10,
            rssi: 11,
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        let checks: &[(usize, FieldKind)] = &[
            (self.elapsed_time, FieldKind::Text),
            (self.sequence_id, FieldKind::Integer),
            (self.timestamp, FieldKind::Text),
            (self.gps_altitude, FieldKind::Float),
            (self.latitude, FieldKind::Float),
            (self.longitude, FieldKind::Float),
            (self.pressure, FieldKind::Float),
            (self.thermistor_ohms, FieldKind::Float),
            (self.humidity, FieldKind::Float),
            (self.co2, FieldKind::Float),
            (self.internal_temp, FieldKind::Float),
            (self.rssi, FieldKind::Text),
        ];

        for &(index, kind) in checks {
            let spec = self.fields.get(index).ok_or_else(|| {
                CansatLinkError::Parse(format!(
                    "schema index {} out of range ({} fields)",
                    index,
                    self.fields.len()
                ))
            })?;
            if spec.kind != kind {
                return Err(CansatLinkError::Parse(format!(
                    "schema field '{}' has kind {:?}, expected {:?}",
                    spec.name, spec.kind, kind
                )));
            }
        }
        Ok(())
    }

    /// Number of fields a frame must carry to be accepted
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Ordered field specs, for validation and the log header
    pub fn fields(&self) -> &[FieldSpec] {
        self.fields
    }

    /// Comma-separated header row for the persisted log
    pub fn header_line(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(",")
    }
}
