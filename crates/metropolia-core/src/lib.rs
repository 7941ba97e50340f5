//! Synthetic sensor streams for the Metropolia smart-city dashboard
//!
//! This crate contains everything behind the dashboard's charts: sensor
//! definitions, the correlated time-of-day signal model, bounded per-sensor
//! rolling buffers, AQI bands and alert levels, and the window statistics
//! the KPI cards and correlation chart are drawn from.
//!
//! The entry point is [`StreamGenerator`]: call
//! [`advance`](StreamGenerator::advance) once per tick and
//! [`snapshot`](StreamGenerator::snapshot) per sensor per render.
//!
//! ```
//! use metropolia_core::{StreamConfig, StreamGenerator};
//!
//! let mut generator = StreamGenerator::new(StreamConfig::default(), 7)?;
//! generator.advance(1_704_067_200_000);
//! assert_eq!(generator.snapshot("downtown")?.len(), 1);
//! # Ok::<(), metropolia_core::StreamError>(())
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod pattern;
pub mod reading;
pub mod sensors;
pub mod shared;
pub mod stats;

pub use config::{GeneratorTuning, StreamConfig};
pub use error::{ConfigError, StreamError};
pub use generator::StreamGenerator;
pub use metrics::{AlertLevel, AqiBand, AqiScale, EnergyLoad, SentimentLevel, TrafficLevel};
pub use reading::Reading;
pub use sensors::{GeoPoint, Sensor, SensorId, SensorKind};
pub use shared::SharedStream;
pub use stats::{LinearTrend, Metric, TimeWindow, WindowStats};
