//! Error types for configuration and stream access

use std::path::PathBuf;

use thiserror::Error;

use crate::sensors::SensorId;

/// Rejected configuration. Raised once at startup, never mid-run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("sensor list is empty")]
    NoSensors,
    #[error("sensor id must not be blank")]
    BlankSensorId,
    #[error("duplicate sensor id `{0}`")]
    DuplicateSensor(SensorId),
    #[error("sensor `{id}` has out-of-range coordinate ({lat}, {lon})")]
    InvalidLocation { id: SensorId, lat: f64, lon: f64 },
    #[error("buffer capacity must be between 1 and {max}, got {0}", max = crate::config::MAX_BUFFER_CAPACITY)]
    InvalidCapacity(usize),
    #[error("tick interval must be positive, got {0} ms")]
    InvalidTickInterval(u64),
    #[error("UTC offset must be within ±{max} minutes, got {0}", max = crate::config::MAX_UTC_OFFSET_MINUTES)]
    InvalidUtcOffset(i32),
    #[error("AQI band list is empty")]
    NoAqiBands,
    #[error("AQI band `{label}` upper bound {upper_bound} is not above the previous band")]
    UnorderedAqiBands { label: String, upper_bound: f64 },
    #[error("AQI bands end at {0}, below the AQI ceiling of {1}")]
    IncompleteAqiBands(f64, f64),
    #[error("AQI band `{label}` has malformed color `{color}`, expected #RRGGBB")]
    InvalidColor { label: String, color: String },
    #[error("tuning parameter `{name}` is out of range: {value}")]
    InvalidTuning { name: &'static str, value: f64 },
}

/// Errors from constructing or reading a stream generator.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown sensor `{0}`")]
    UnknownSensor(String),
}
