//! # Unit Converters
//!
//! Pure conversions from raw sensor readings to physical quantities.
//!
//! This module handles:
//! - NTC thermistor resistance to temperature (Steinhart–Hart)
//! - Barometric pressure to altitude (log-ratio model)
//! - Payload tilt angle from GPS position and altitude
//!
//! All functions are stateless and safe to call from any thread. Inputs
//! outside the physical domain return [`CansatLinkError::Domain`].

use crate::error::{CansatLinkError, Result};

/// Steinhart–Hart material constants for the flight NTC thermistor
pub const STEINHART_A: f64 = 3.354016e-3;
pub const STEINHART_B: f64 = 2.569850e-4;
pub const STEINHART_C: f64 = 2.620131e-6;
pub const STEINHART_D: f64 = 6.383091e-8;

/// Reference resistance of the NTC at 25 °C (Ω)
pub const NTC_REFERENCE_OHMS: f64 = 10_000.0;

/// Sea-level reference pressure measured at the launch site (Pa)
///
/// The 1976 standard atmosphere value is 101 325 Pa; the flight campaign
/// recorded 101 036 Pa at launch, and the offline analysis uses that. It
/// can be overridden through `[altimetry] reference_pressure_pa`.
pub const DEFAULT_REFERENCE_PRESSURE_PA: f64 = 101_036.0;

/// Universal gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.3144598;

/// Molar mass of dry air (kg/mol)
pub const MOLAR_MASS_AIR: f64 = 0.02896968;

/// Standard gravity (m/s²)
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Mean Earth radius for great-circle distance (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Convert NTC thermistor resistance to temperature
///
/// Applies the Steinhart–Hart polynomial on `ln(r / 10kΩ)`:
/// `T = 1 / (A + B·x + C·x² + D·x³) − 273.15`.
///
/// # Arguments
///
/// * `resistance_ohms` - Measured thermistor resistance in ohms
///
/// # Returns
///
/// * `Result<f64>` - Temperature in °C
///
/// # Errors
///
/// Returns `Domain` error if the resistance is not a positive finite
/// number (the logarithm is undefined).
pub fn thermistor_to_celsius(resistance_ohms: f64) -> Result<f64> {
    if !resistance_ohms.is_finite() || resistance_ohms <= 0.0 {
        return Err(CansatLinkError::Domain(format!(
            "thermistor resistance must be positive, got {} Ω",
            resistance_ohms
        )));
    }

    let log_r = (resistance_ohms / NTC_REFERENCE_OHMS).ln();
    let kelvin = 1.0
        / (STEINHART_A
            + STEINHART_B * log_r
            + STEINHART_C * log_r * log_r
            + STEINHART_D * log_r * log_r * log_r);

    Ok(kelvin - 273.15)
}

/// Convert barometric pressure to altitude above the reference level
///
/// Uses the log-ratio form of the barometric formula:
/// `z = ln(P / P0) · R · T / (−M · g)` with the external temperature in
/// kelvin. Pressure equal to the reference maps to 0 m; lower pressure
/// maps to higher altitude.
///
/// # Arguments
///
/// * `pressure_pa` - Measured static pressure in pascals
/// * `external_temp_c` - External air temperature in °C
/// * `reference_pa` - Sea-level reference pressure in pascals
///
/// # Returns
///
/// * `Result<f64>` - Altitude in metres
///
/// # Errors
///
/// Returns `Domain` error if the pressure is not a positive finite number.
pub fn pressure_to_altitude(pressure_pa: f64, external_temp_c: f64, reference_pa: f64) -> Result<f64> {
    if !pressure_pa.is_finite() || pressure_pa <= 0.0 {
        return Err(CansatLinkError::Domain(format!(
            "pressure must be positive, got {} Pa",
            pressure_pa
        )));
    }

    let temp_k = external_temp_c + 273.15;
    let altitude = (pressure_pa / reference_pa).ln() * GAS_CONSTANT * temp_k
        / (-MOLAR_MASS_AIR * STANDARD_GRAVITY);

    Ok(altitude)
}

/// Great-circle surface distance between two positions (haversine)
///
/// # Arguments
///
/// * `lat1`, `lng1` - First position in degrees
/// * `lat2`, `lng2` - Second position in degrees
///
/// # Returns
///
/// * `f64` - Surface distance in metres
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Tilt angle of the payload as seen from the ground-station reference
///
/// Computes the haversine surface distance from the reference position to
/// the payload's ground track, then `atan2(altitude, distance)` in degrees.
/// A payload directly overhead approaches 90°; a payload on the ground at
/// the reference position is defined as 0° (`atan2(0, 0)` is 0).
///
/// # Arguments
///
/// * `altitude_m` - Payload altitude in metres
/// * `lat`, `lng` - Payload position in degrees
/// * `ref_lat`, `ref_lng` - Ground-station reference position in degrees
///
/// # Returns
///
/// * `f64` - Tilt angle in degrees
pub fn tilt_from_position(altitude_m: f64, lat: f64, lng: f64, ref_lat: f64, ref_lng: f64) -> f64 {
    let surface_distance = haversine_distance(lat, lng, ref_lat, ref_lng);
    altitude_m.atan2(surface_distance).to_degrees()
}
