//! Timestamped sensor readings and their domain bounds

use core::fmt::Display;

use serde::{Deserialize, Serialize};

/// Closed interval a generated value must stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp a value into the interval. NaN collapses to the lower bound.
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Air Quality Index.
pub const AIR_QUALITY_INDEX: Bounds = Bounds::new(0.0, 500.0);
/// Road occupancy in percent.
pub const TRAFFIC_DENSITY: Bounds = Bounds::new(0.0, 100.0);
/// Average vehicle speed in km/h.
pub const VEHICLE_SPEED: Bounds = Bounds::new(5.0, 120.0);
/// Site power draw in kW.
pub const ENERGY_CONSUMPTION: Bounds = Bounds::new(0.0, 2000.0);
/// Citizen feedback sentiment, negative to positive.
pub const SENTIMENT_SCORE: Bounds = Bounds::new(-1.0, 1.0);
/// Air temperature in °C.
pub const TEMPERATURE: Bounds = Bounds::new(-40.0, 60.0);
/// Relative humidity in percent.
pub const HUMIDITY: Bounds = Bounds::new(0.0, 100.0);

/// One sensor's values for one tick.
///
/// Readings are produced by the generator and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Tick number that produced this reading, starting at 1.
    pub sequence: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub air_quality_index: f64,
    pub traffic_density: f64,
    pub vehicle_speed: f64,
    pub energy_consumption: f64,
    pub sentiment_score: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl Reading {
    /// Whether every field lies inside its domain bounds.
    pub fn is_within_bounds(&self) -> bool {
        AIR_QUALITY_INDEX.contains(self.air_quality_index)
            && TRAFFIC_DENSITY.contains(self.traffic_density)
            && VEHICLE_SPEED.contains(self.vehicle_speed)
            && ENERGY_CONSUMPTION.contains(self.energy_consumption)
            && SENTIMENT_SCORE.contains(self.sentiment_score)
            && TEMPERATURE.contains(self.temperature)
            && HUMIDITY.contains(self.humidity)
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Reading #{}] ts: {}, aqi: {:.0}, traffic: {:.0}%, speed: {:.0} km/h, energy: {:.0} kW, sentiment: {:+.2}, temp: {:.1}°C, humidity: {:.0}%",
            self.sequence,
            self.timestamp_ms,
            self.air_quality_index,
            self.traffic_density,
            self.vehicle_speed,
            self.energy_consumption,
            self.sentiment_score,
            self.temperature,
            self.humidity
        )
    }
}
