//! Stream configuration loading and validation
//!
//! Every field is optional in the TOML file; omitted fields take the
//! defaults of the stock Metropolia deployment. Validation happens once,
//! when a generator is built, and any problem is reported as a
//! [`ConfigError`].
//!
//! ```toml
//! buffer_capacity = 500
//! tick_interval_ms = 5000
//!
//! [[sensors]]
//! id = "harbour"
//! name = "Harbour"
//! kind = "transportation"
//! location = { lat = 40.70, lon = -74.01 }
//!
//! [tuning]
//! aqi_traffic_coupling = 0.4
//! ```

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metrics::{AqiBand, AqiScale, default_aqi_bands};
use crate::sensors::{Sensor, default_city_sensors};

/// Readings retained per sensor.
pub const DEFAULT_BUFFER_CAPACITY: usize = 500;

/// Dashboard refresh interval.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5000;

/// Largest accepted buffer capacity, about eight weeks of 5 s ticks.
pub const MAX_BUFFER_CAPACITY: usize = 1_000_000;

/// Widest real-world UTC offset (UTC+14).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    pub sensors: Vec<Sensor>,
    pub buffer_capacity: usize,
    pub tick_interval_ms: u64,
    /// Shift applied to tick timestamps before deriving the time of day.
    pub utc_offset_minutes: i32,
    pub aqi_bands: Vec<AqiBand>,
    pub tuning: GeneratorTuning,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sensors: default_city_sensors(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            utc_offset_minutes: 0,
            aqi_bands: default_aqi_bands(),
            tuning: GeneratorTuning::default(),
        }
    }
}

impl StreamConfig {
    /// Parse a TOML document. The result is not validated yet.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check every field, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_sensors()?;
        self.capacity()?;

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval(self.tick_interval_ms));
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidUtcOffset(self.utc_offset_minutes));
        }

        self.aqi_scale()?;
        self.tuning.validate()
    }

    /// Buffer capacity as a non-zero count no larger than [`MAX_BUFFER_CAPACITY`].
    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.buffer_capacity)
            .filter(|capacity| capacity.get() <= MAX_BUFFER_CAPACITY)
            .ok_or(ConfigError::InvalidCapacity(self.buffer_capacity))
    }

    /// Build the AQI scale from the configured bands.
    pub fn aqi_scale(&self) -> Result<AqiScale, ConfigError> {
        AqiScale::new(self.aqi_bands.clone())
    }

    fn validate_sensors(&self) -> Result<(), ConfigError> {
        if self.sensors.is_empty() {
            return Err(ConfigError::NoSensors);
        }

        let mut seen = BTreeSet::new();
        for sensor in &self.sensors {
            if sensor.id.as_str().trim().is_empty() {
                return Err(ConfigError::BlankSensorId);
            }
            if !seen.insert(&sensor.id) {
                return Err(ConfigError::DuplicateSensor(sensor.id.clone()));
            }
            if !sensor.location.is_valid() {
                return Err(ConfigError::InvalidLocation {
                    id: sensor.id.clone(),
                    lat: sensor.location.lat,
                    lon: sensor.location.lon,
                });
            }
        }

        Ok(())
    }
}

/// Coefficients of the synthetic signal model.
///
/// Noise values are standard deviations of the per-tick Gaussian
/// perturbation, in the unit of the field they perturb.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorTuning {
    /// AQI with no traffic at all.
    pub aqi_floor: f64,
    /// AQI added per percent of traffic density.
    pub aqi_traffic_coupling: f64,
    pub aqi_noise: f64,
    /// Multiplier on the time-of-day traffic baseline.
    pub traffic_scale: f64,
    pub traffic_noise: f64,
    /// Speed on an empty road, km/h.
    pub free_flow_speed: f64,
    /// Speed lost at 100 % traffic density, km/h.
    pub speed_traffic_drag: f64,
    pub speed_noise: f64,
    pub energy_noise: f64,
    pub temperature_noise: f64,
    pub humidity_noise: f64,
    pub sentiment_noise: f64,
    /// Fraction of each random-walk offset decayed per tick, in [0, 1].
    pub walk_reversion: f64,
}

impl Default for GeneratorTuning {
    fn default() -> Self {
        Self {
            aqi_floor: 40.0,
            aqi_traffic_coupling: 0.3,
            aqi_noise: 5.0,
            traffic_scale: 1.0,
            traffic_noise: 5.0,
            free_flow_speed: 60.0,
            speed_traffic_drag: 30.0,
            speed_noise: 5.0,
            energy_noise: 50.0,
            temperature_noise: 1.5,
            humidity_noise: 3.0,
            sentiment_noise: 0.05,
            walk_reversion: 0.05,
        }
    }
}

impl GeneratorTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("aqi_floor", self.aqi_floor),
            ("aqi_traffic_coupling", self.aqi_traffic_coupling),
            ("aqi_noise", self.aqi_noise),
            ("traffic_scale", self.traffic_scale),
            ("traffic_noise", self.traffic_noise),
            ("free_flow_speed", self.free_flow_speed),
            ("speed_traffic_drag", self.speed_traffic_drag),
            ("speed_noise", self.speed_noise),
            ("energy_noise", self.energy_noise),
            ("temperature_noise", self.temperature_noise),
            ("humidity_noise", self.humidity_noise),
            ("sentiment_noise", self.sentiment_noise),
            ("walk_reversion", self.walk_reversion),
        ];

        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTuning { name, value });
            }
        }

        if self.walk_reversion > 1.0 {
            return Err(ConfigError::InvalidTuning {
                name: "walk_reversion",
                value: self.walk_reversion,
            });
        }

        Ok(())
    }
}
