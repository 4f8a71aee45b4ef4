//! # Telemetry Sample
//!
//! The immutable derived record built from one accepted wire frame.

use crate::error::Result;
use crate::frame::parser::RawFrame;
use crate::frame::schema::FrameSchema;
use crate::units;

/// One accepted telemetry frame with derived physical quantities
///
/// Constructed only from a [`RawFrame`] that passed arity and numeric
/// validation; immutable thereafter. The derived fields are pure functions
/// of the raw ones, so re-running ingestion over the same log reproduces
/// them bit for bit.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    /// Device-reported elapsed time, kept verbatim
    pub elapsed_time: String,
    /// Monotonic frame counter from the device; arrival order is not
    /// guaranteed, offline analysis re-sorts on this
    pub sequence_id: u64,
    /// Device wall-clock timestamp (HH:MM:SS), kept verbatim
    pub timestamp: String,
    /// GPS altitude (m)
    pub gps_altitude: f64,
    /// GPS latitude (deg); (0, 0) with longitude means no fix
    pub latitude: f64,
    /// GPS longitude (deg)
    pub longitude: f64,
    /// Static pressure (Pa)
    pub pressure: f64,
    /// NTC thermistor resistance (Ω)
    pub thermistor_ohms: f64,
    /// Relative humidity (%RH)
    pub humidity: f64,
    /// CO2 concentration (ppm)
    pub co2: f64,
    /// Internal payload temperature (°C)
    pub internal_temp: f64,
    /// Received signal strength, kept verbatim (some ground stations
    /// report it as text)
    pub rssi: String,
    /// Derived: external temperature from the thermistor (°C)
    pub external_temp: f64,
    /// Derived: barometric altitude from pressure and external temp (m)
    pub barometric_altitude: f64,
    /// Derived: tilt from the ground-station reference (deg); `None`
    /// without a GPS fix
    pub tilt: Option<f64>,
}

impl TelemetrySample {
    /// Build a sample from a validated frame
    ///
    /// Runs the unit converters over the raw fields. A converter domain
    /// error (non-physical resistance or pressure) fails the whole sample;
    /// no partially derived record is ever produced.
    ///
    /// # Arguments
    ///
    /// * `frame` - Validated wire frame
    /// * `schema` - The positional wire schema
    /// * `reference_pa` - Sea-level reference pressure for altimetry
    /// * `ref_lat`, `ref_lng` - Ground-station position for tilt
    ///
    /// # Errors
    ///
    /// Returns `Domain` error if the thermistor resistance or pressure is
    /// outside its physical domain.
    pub fn from_frame(
        frame: &RawFrame,
        schema: &FrameSchema,
        reference_pa: f64,
        ref_lat: f64,
        ref_lng: f64,
    ) -> Result<Self> {
        // Numeric parses cannot fail here: the parser already validated
        // every field against its schema kind.
        let parse_f64 = |index: usize| frame.field(index).parse::<f64>().unwrap_or_default();

        let gps_altitude = parse_f64(schema.gps_altitude);
        let latitude = parse_f64(schema.latitude);
        let longitude = parse_f64(schema.longitude);
        let pressure = parse_f64(schema.pressure);
        let thermistor_ohms = parse_f64(schema.thermistor_ohms);

        let external_temp = units::thermistor_to_celsius(thermistor_ohms)?;
        let barometric_altitude = units::pressure_to_altitude(pressure, external_temp, reference_pa)?;

        let has_fix = !(latitude == 0.0 && longitude == 0.0);
        let tilt = has_fix
            .then(|| units::tilt_from_position(gps_altitude, latitude, longitude, ref_lat, ref_lng));

        Ok(Self {
            elapsed_time: frame.field(schema.elapsed_time).to_string(),
            sequence_id: frame.field(schema.sequence_id).parse().unwrap_or_default(),
            timestamp: frame.field(schema.timestamp).to_string(),
            gps_altitude,
            latitude,
            longitude,
            pressure,
            thermistor_ohms,
            humidity: parse_f64(schema.humidity),
            co2: parse_f64(schema.co2),
            internal_temp: parse_f64(schema.internal_temp),
            rssi: frame.field(schema.rssi).to_string(),
            external_temp,
            barometric_altitude,
            tilt,
        })
    }

    /// Whether the GPS reported a position fix
    ///
    /// The firmware emits exactly `(0, 0)` until the receiver locks on;
    /// those coordinates never enter the position track.
    pub fn has_gps_fix(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}
