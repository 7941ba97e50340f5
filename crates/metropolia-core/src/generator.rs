//! Correlated synthetic sensor streams
//!
//! [`StreamGenerator`] owns one rolling buffer per configured sensor and
//! produces one [`Reading`] per sensor on every [`advance`]. Each value is
//! built from three parts:
//!
//! - a smooth time-of-day baseline (see [`crate::pattern`]),
//! - a bounded, mean-reverting random-walk offset kept per sensor, giving
//!   every site its own slowly wandering character,
//! - fresh Gaussian noise for the tick.
//!
//! Traffic density feeds the AQI linearly and drags vehicle speed down, so
//! busy roads mean dirtier air. Every value is clamped into its domain
//! bounds after the blend, whatever the walk has accumulated.
//!
//! Each sensor consumes the same number of random draws per tick in the same
//! order, so a fixed seed yields the same noise no matter what the baselines
//! are. That keeps runs reproducible and makes the traffic→AQI coupling
//! monotonic for a fixed seed.
//!
//! [`advance`]: StreamGenerator::advance

use std::collections::BTreeMap;

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::buffer::RollingBuffer;
use crate::config::{GeneratorTuning, StreamConfig};
use crate::error::StreamError;
use crate::metrics::AqiScale;
use crate::pattern::{Baseline, hour_of_day, sentiment_baseline};
use crate::reading::{
    AIR_QUALITY_INDEX, ENERGY_CONSUMPTION, HUMIDITY, Reading, SENTIMENT_SCORE, TEMPERATURE,
    TRAFFIC_DENSITY, VEHICLE_SPEED,
};
use crate::sensors::{Sensor, SensorId};

/// Shape of one per-sensor random walk.
struct WalkShape {
    /// Standard deviation of each tick's step.
    step: f64,
    /// Offsets are clamped to `[-limit, limit]`.
    limit: f64,
    /// Standard deviation of the offset a sensor starts with.
    initial_spread: f64,
}

const AQI_WALK: WalkShape = WalkShape {
    step: 2.0,
    limit: 60.0,
    initial_spread: 15.0,
};

const TRAFFIC_WALK: WalkShape = WalkShape {
    step: 3.0,
    limit: 25.0,
    initial_spread: 10.0,
};

const SPEED_WALK: WalkShape = WalkShape {
    step: 2.0,
    limit: 15.0,
    initial_spread: 5.0,
};

const TEMPERATURE_WALK: WalkShape = WalkShape {
    step: 0.5,
    limit: 5.0,
    initial_spread: 3.0,
};

const SENTIMENT_WALK: WalkShape = WalkShape {
    step: 0.05,
    limit: 0.5,
    initial_spread: 0.2,
};

/// One standard normal draw.
fn gauss(rng: &mut StdRng) -> f64 {
    rng.sample(StandardNormal)
}

/// AQI implied by a traffic density before walk and noise.
///
/// Non-decreasing in `traffic_density` for any non-negative coupling.
pub fn coupled_aqi(aqi_floor: f64, coupling: f64, traffic_density: f64) -> f64 {
    aqi_floor + coupling * traffic_density
}

/// Bounded mean-reverting offset.
#[derive(Debug, Clone, Copy)]
struct Walk {
    offset: f64,
    limit: f64,
}

impl Walk {
    fn seeded(shape: &WalkShape, rng: &mut StdRng) -> Self {
        let offset = (shape.initial_spread * gauss(rng)).clamp(-shape.limit, shape.limit);
        Self {
            offset,
            limit: shape.limit,
        }
    }

    fn step(&mut self, shock: f64, reversion: f64) -> f64 {
        self.offset = (self.offset * (1.0 - reversion) + shock).clamp(-self.limit, self.limit);
        self.offset
    }
}

/// Per-sensor buffer and walk state.
struct SensorStream {
    sensor: Sensor,
    buffer: RollingBuffer<Reading>,
    aqi: Walk,
    traffic: Walk,
    speed: Walk,
    temperature: Walk,
    sentiment: Walk,
}

impl SensorStream {
    fn new(sensor: Sensor, buffer: RollingBuffer<Reading>, rng: &mut StdRng) -> Self {
        Self {
            sensor,
            buffer,
            aqi: Walk::seeded(&AQI_WALK, rng),
            traffic: Walk::seeded(&TRAFFIC_WALK, rng),
            speed: Walk::seeded(&SPEED_WALK, rng),
            temperature: Walk::seeded(&TEMPERATURE_WALK, rng),
            sentiment: Walk::seeded(&SENTIMENT_WALK, rng),
        }
    }

    /// Compute this sensor's next reading. Always draws exactly twelve
    /// normals, walks first.
    fn next_reading(
        &mut self,
        rng: &mut StdRng,
        tuning: &GeneratorTuning,
        baseline: &Baseline,
        sequence: u64,
        timestamp_ms: u64,
    ) -> Reading {
        let reversion = tuning.walk_reversion;
        let kind = self.sensor.kind;

        let traffic_walk = self.traffic.step(TRAFFIC_WALK.step * gauss(rng), reversion);
        let aqi_walk = self.aqi.step(AQI_WALK.step * gauss(rng), reversion);
        let speed_walk = self.speed.step(SPEED_WALK.step * gauss(rng), reversion);
        let temperature_walk = self
            .temperature
            .step(TEMPERATURE_WALK.step * gauss(rng), reversion);
        let sentiment_walk = self
            .sentiment
            .step(SENTIMENT_WALK.step * gauss(rng), reversion);

        let traffic_density = TRAFFIC_DENSITY.clamp(
            100.0 * baseline.traffic_factor * kind.traffic_weight() * tuning.traffic_scale
                + traffic_walk
                + tuning.traffic_noise * gauss(rng),
        );

        let air_quality_index = AIR_QUALITY_INDEX.clamp(
            coupled_aqi(tuning.aqi_floor, tuning.aqi_traffic_coupling, traffic_density)
                + aqi_walk
                + tuning.aqi_noise * gauss(rng),
        );

        let vehicle_speed = VEHICLE_SPEED.clamp(
            tuning.free_flow_speed - tuning.speed_traffic_drag * traffic_density / 100.0
                + speed_walk
                + tuning.speed_noise * gauss(rng),
        );

        let energy_consumption = ENERGY_CONSUMPTION.clamp(
            baseline.energy * kind.energy_weight() + tuning.energy_noise * gauss(rng),
        );

        let temperature = TEMPERATURE.clamp(
            baseline.temperature + temperature_walk + tuning.temperature_noise * gauss(rng),
        );

        let humidity = HUMIDITY.clamp(baseline.humidity + tuning.humidity_noise * gauss(rng));

        let sentiment_score = SENTIMENT_SCORE.clamp(
            sentiment_baseline(air_quality_index)
                + sentiment_walk
                + tuning.sentiment_noise * gauss(rng),
        );

        Reading {
            sequence,
            timestamp_ms,
            air_quality_index,
            traffic_density,
            vehicle_speed,
            energy_consumption,
            sentiment_score,
            temperature,
            humidity,
        }
    }
}

/// Synthetic stream source for every configured sensor.
///
/// Only [`advance`](Self::advance) appends readings ([`warm_up`](Self::warm_up)
/// is a series of advances); every other method only reads. Buffers start
/// empty and construction never pre-fills them.
pub struct StreamGenerator {
    config: StreamConfig,
    aqi_scale: AqiScale,
    streams: Vec<SensorStream>,
    /// Position of each sensor in `streams`.
    index: BTreeMap<SensorId, usize>,
    rng: StdRng,
    tick_count: u64,
    last_timestamp_ms: Option<u64>,
}

impl StreamGenerator {
    /// Validate the configuration and build a generator with a fixed seed.
    pub fn new(config: StreamConfig, seed: u64) -> Result<Self, StreamError> {
        config.validate()?;
        let capacity = config.capacity()?;
        let aqi_scale = config.aqi_scale()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let streams: Vec<_> = config
            .sensors
            .iter()
            .cloned()
            .map(|sensor| SensorStream::new(sensor, RollingBuffer::new(capacity), &mut rng))
            .collect();

        let index = streams
            .iter()
            .enumerate()
            .map(|(i, stream)| (stream.sensor.id.clone(), i))
            .collect();

        info!(
            "Stream generator ready: {} sensors, capacity {}, tick {} ms, seed {}",
            streams.len(),
            capacity,
            config.tick_interval_ms,
            seed
        );

        Ok(Self {
            config,
            aqi_scale,
            streams,
            index,
            rng,
            tick_count: 0,
            last_timestamp_ms: None,
        })
    }

    /// Build a generator seeded from the thread-local entropy source.
    pub fn from_entropy(config: StreamConfig) -> Result<Self, StreamError> {
        Self::new(config, rand::random())
    }

    /// Produce one reading per sensor for `now_ms` and append it to that
    /// sensor's buffer, evicting the oldest reading when full.
    ///
    /// A timestamp earlier than the previous tick is replaced by the
    /// previous tick's, keeping every buffer non-decreasing in time.
    pub fn advance(&mut self, now_ms: u64) -> BTreeMap<SensorId, Reading> {
        let timestamp_ms = match self.last_timestamp_ms {
            Some(last) if now_ms < last => {
                warn!(
                    "Tick time {} ms is {} ms behind the previous tick, reusing {} ms",
                    now_ms,
                    last - now_ms,
                    last
                );
                last
            }
            _ => now_ms,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        self.tick_count += 1;

        let baseline = Baseline::at(hour_of_day(timestamp_ms, self.config.utc_offset_minutes));
        let tuning = &self.config.tuning;

        let mut produced = BTreeMap::new();
        for stream in &mut self.streams {
            let reading = stream.next_reading(
                &mut self.rng,
                tuning,
                &baseline,
                self.tick_count,
                timestamp_ms,
            );

            if let Some(evicted) = stream.buffer.push(reading) {
                trace!(
                    "{}: evicted reading #{} from {} ms",
                    stream.sensor.id, evicted.sequence, evicted.timestamp_ms
                );
            }
            produced.insert(stream.sensor.id.clone(), reading);
        }

        debug!(
            "Tick {} at {} ms (hour {:.2}, traffic factor {:.2}): {} readings",
            self.tick_count,
            timestamp_ms,
            baseline.hour,
            baseline.traffic_factor,
            produced.len()
        );

        produced
    }

    /// Advance `ticks` times, one tick interval apart, ending at `end_ms`.
    ///
    /// Gives the dashboard some history to draw on its first frame.
    pub fn warm_up(&mut self, ticks: usize, end_ms: u64) {
        if ticks == 0 {
            return;
        }

        let interval = self.config.tick_interval_ms;
        let span = interval.saturating_mul(ticks as u64 - 1);
        let start_ms = end_ms.saturating_sub(span);

        for i in 0..ticks as u64 {
            self.advance(start_ms.saturating_add(i.saturating_mul(interval)));
        }

        info!("Warmed up {} ticks ending at {} ms", ticks, end_ms);
    }

    /// Buffered readings for a sensor, oldest first.
    pub fn snapshot(&self, sensor_id: &str) -> Result<Vec<Reading>, StreamError> {
        Ok(self.stream(sensor_id)?.buffer.to_vec())
    }

    /// Buffered readings for every sensor, keyed by id.
    pub fn snapshot_all(&self) -> BTreeMap<SensorId, Vec<Reading>> {
        self.streams
            .iter()
            .map(|stream| (stream.sensor.id.clone(), stream.buffer.to_vec()))
            .collect()
    }

    /// Most recent reading for a sensor, if any tick has run.
    pub fn latest(&self, sensor_id: &str) -> Result<Option<Reading>, StreamError> {
        Ok(self.stream(sensor_id)?.buffer.latest().copied())
    }

    /// Configured sensors in configuration order.
    pub fn sensors(&self) -> impl Iterator<Item = &Sensor> + '_ {
        self.streams.iter().map(|stream| &stream.sensor)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn aqi_scale(&self) -> &AqiScale {
        &self.aqi_scale
    }

    fn stream(&self, sensor_id: &str) -> Result<&SensorStream, StreamError> {
        self.index
            .get(sensor_id)
            .map(|&i| &self.streams[i])
            .ok_or_else(|| StreamError::UnknownSensor(sensor_id.to_owned()))
    }
}
