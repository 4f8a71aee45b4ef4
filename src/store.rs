//! # Rolling Store
//!
//! Bounded-latency shared buffers for the live display layer.
//!
//! This module handles:
//! - Append-only per-channel buffers of derived values
//! - The GPS position track (fix-only coordinates)
//! - The latest-sample cell
//! - Point-in-time snapshots for concurrent readers
//!
//! The store is single-writer (the ingest loop) and multi-reader. Readers
//! only ever see whole appended elements: every read copies under the
//! channel's `RwLock`, so a snapshot is always a prefix of fully-appended
//! values and, while uncapped, never shrinks between reads.

use std::collections::VecDeque;
use std::sync::RwLock;

use crate::frame::TelemetrySample;

/// A derived telemetry channel held by the rolling store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    BarometricAltitude,
    GpsAltitude,
    Pressure,
    ExternalTemp,
    InternalTemp,
    Humidity,
    Co2,
    ThermistorOhms,
    Rssi,
}

impl Channel {
    /// All channels, in display order
    pub const ALL: [Channel; 9] = [
        Channel::BarometricAltitude,
        Channel::GpsAltitude,
        Channel::Pressure,
        Channel::ExternalTemp,
        Channel::InternalTemp,
        Channel::Humidity,
        Channel::Co2,
        Channel::ThermistorOhms,
        Channel::Rssi,
    ];

    fn index(self) -> usize {
        match self {
            Channel::BarometricAltitude => 0,
            Channel::GpsAltitude => 1,
            Channel::Pressure => 2,
            Channel::ExternalTemp => 3,
            Channel::InternalTemp => 4,
            Channel::Humidity => 5,
            Channel::Co2 => 6,
            Channel::ThermistorOhms => 7,
            Channel::Rssi => 8,
        }
    }
}

/// Shared rolling buffers read by the display layer while the ingest loop
/// appends
///
/// Unbounded by default (an append-only flight record); `max_samples`
/// opts into oldest-first eviction for long-duration operation.
pub struct RollingStore {
    channels: [RwLock<VecDeque<f64>>; 9],
    track: RwLock<VecDeque<(f64, f64)>>,
    latest: RwLock<Option<TelemetrySample>>,
    max_samples: Option<usize>,
}

impl RollingStore {
    /// Create a store, optionally capped at `max_samples` per channel
    ///
    /// A zero capacity is normalized to unbounded: a buffer that can never
    /// hold a sample has no meaningful eviction order.
    pub fn new(max_samples: Option<usize>) -> Self {
        Self {
            channels: std::array::from_fn(|_| RwLock::new(VecDeque::new())),
            track: RwLock::new(VecDeque::new()),
            latest: RwLock::new(None),
            max_samples: max_samples.filter(|&max| max > 0),
        }
    }

    /// Append one value to a channel buffer
    ///
    /// The only mutator for channel data. Evicts the oldest value first
    /// when a capacity is configured.
    pub fn append(&self, channel: Channel, value: f64) {
        let mut buffer = self.channels[channel.index()].write().unwrap();
        if let Some(max) = self.max_samples {
            while buffer.len() >= max {
                buffer.pop_front();
            }
        }
        buffer.push_back(value);
    }

    /// Publish an accepted sample to every relevant channel
    ///
    /// RSSI is only charted when the ground station reports it numerically;
    /// the verbatim value stays on the sample either way. No-fix `(0, 0)`
    /// coordinates are excluded from the position track.
    pub fn publish(&self, sample: &TelemetrySample) {
        self.append(Channel::BarometricAltitude, sample.barometric_altitude);
        self.append(Channel::GpsAltitude, sample.gps_altitude);
        self.append(Channel::Pressure, sample.pressure);
        self.append(Channel::ExternalTemp, sample.external_temp);
        self.append(Channel::InternalTemp, sample.internal_temp);
        self.append(Channel::Humidity, sample.humidity);
        self.append(Channel::Co2, sample.co2);
        self.append(Channel::ThermistorOhms, sample.thermistor_ohms);
        if let Ok(rssi) = sample.rssi.parse::<f64>() {
            self.append(Channel::Rssi, rssi);
        }

        if sample.has_gps_fix() {
            let mut track = self.track.write().unwrap();
            if let Some(max) = self.max_samples {
                while track.len() >= max {
                    track.pop_front();
                }
            }
            track.push_back((sample.latitude, sample.longitude));
        }

        *self.latest.write().unwrap() = Some(sample.clone());
    }

    /// Point-in-time copy of a channel buffer
    pub fn snapshot(&self, channel: Channel) -> Vec<f64> {
        self.channels[channel.index()]
            .read()
            .unwrap()
            .iter()
            .copied()
            .collect()
    }

    /// Point-in-time copy of the GPS position track
    pub fn position_track(&self) -> Vec<(f64, f64)> {
        self.track.read().unwrap().iter().copied().collect()
    }

    /// The most recently accepted sample, if any
    pub fn latest(&self) -> Option<TelemetrySample> {
        self.latest.read().unwrap().clone()
    }

    /// Number of values currently held for a channel
    pub fn len(&self, channel: Channel) -> usize {
        self.channels[channel.index()].read().unwrap().len()
    }

    /// Whether nothing has been accepted yet
    pub fn is_empty(&self) -> bool {
        self.len(Channel::Pressure) == 0
    }
}
