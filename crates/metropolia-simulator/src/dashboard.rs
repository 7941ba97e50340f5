//! One rendered dashboard frame, built from generator snapshots
//!
//! A [`Frame`] is everything the dashboard would draw for one tick: the
//! alert banner, the city KPI cards, the citizen sentiment breakdown, the
//! live sensor table and the AQI-versus-traffic trend line. It only reads
//! from the generator.

use core::fmt;

use serde::Serialize;

use metropolia_core::stats::{self, LinearTrend, Metric, TimeWindow, WindowStats};
use metropolia_core::{
    AlertLevel, EnergyLoad, Reading, SensorId, SensorKind, SentimentLevel, StreamError,
    StreamGenerator, TrafficLevel,
};

/// Readings per sensor fed into the correlation fit.
const CORRELATION_POINTS: usize = 50;

/// Headline alert, driven by the worst AQI across the city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub level: AlertLevel,
    pub message: String,
    pub sensor: SensorId,
}

/// City-wide KPI card over the last five minutes.
///
/// Each tick contributes the mean across all sensors, so `latest` is the
/// current city average and `delta` its change since the previous tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub metric: Metric,
    pub unit: &'static str,
    pub stats: WindowStats,
}

/// Citizen feedback split into positive, neutral and negative readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentBreakdown {
    /// Count every sentiment score by level.
    pub fn tally<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Self {
        let mut breakdown = Self::default();
        for reading in readings {
            match SentimentLevel::assess(reading.sentiment_score) {
                SentimentLevel::Positive => breakdown.positive += 1,
                SentimentLevel::Neutral => breakdown.neutral += 1,
                SentimentLevel::Negative => breakdown.negative += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    pub fn count(&self, level: SentimentLevel) -> usize {
        match level {
            SentimentLevel::Positive => self.positive,
            SentimentLevel::Neutral => self.neutral,
            SentimentLevel::Negative => self.negative,
        }
    }

    /// Fraction of readings at `level`, 0 when nothing was counted.
    pub fn share(&self, level: SentimentLevel) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(level) as f64 / total as f64,
        }
    }
}

/// One row of the live sensor table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRow {
    pub id: SensorId,
    pub name: String,
    pub kind: SensorKind,
    pub reading: Reading,
    pub aqi_band: String,
    pub aqi_color: String,
    pub traffic: TrafficLevel,
    pub energy: EnergyLoad,
    pub energy_over_threshold: bool,
    /// Mean AQI over the last five minutes.
    pub aqi_avg_5m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub tick: u64,
    pub timestamp_ms: u64,
    pub banner: Banner,
    pub kpis: Vec<Kpi>,
    /// Feedback across every sensor over the last five minutes.
    pub sentiment: SentimentBreakdown,
    pub sensors: Vec<SensorRow>,
    pub aqi_vs_traffic: Option<LinearTrend>,
}

impl Frame {
    /// Build the frame for the most recent tick.
    ///
    /// Returns `None` before the first tick, when there is nothing to draw.
    pub fn build(generator: &StreamGenerator) -> Result<Option<Self>, StreamError> {
        let mut rows = Vec::new();
        let mut snapshots = Vec::new();
        let mut recent = Vec::new();

        for sensor in generator.sensors() {
            let snapshot = generator.snapshot(sensor.id.as_str())?;
            let Some(&reading) = snapshot.last() else {
                return Ok(None);
            };

            let band = generator.aqi_scale().classify(reading.air_quality_index);
            let aqi_avg_5m = stats::window_stats(
                &snapshot,
                Metric::AirQualityIndex,
                TimeWindow::FiveMinutes,
                reading.timestamp_ms,
            )
            .map(|s| s.mean);

            rows.push(SensorRow {
                id: sensor.id.clone(),
                name: sensor.display_name(),
                kind: sensor.kind,
                reading,
                aqi_band: band.label.clone(),
                aqi_color: band.color.clone(),
                traffic: TrafficLevel::assess(reading.traffic_density),
                energy: EnergyLoad::assess(reading.energy_consumption),
                energy_over_threshold: EnergyLoad::exceeds_threshold(reading.energy_consumption),
                aqi_avg_5m,
            });

            let skip = snapshot.len().saturating_sub(CORRELATION_POINTS);
            recent.extend_from_slice(&snapshot[skip..]);
            snapshots.push(snapshot);
        }

        // Sensors advance together, so every row shares one timestamp
        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let timestamp_ms = first.reading.timestamp_ms;

        let worst = rows
            .iter()
            .max_by(|a, b| {
                a.reading
                    .air_quality_index
                    .total_cmp(&b.reading.air_quality_index)
            })
            .unwrap_or(first);
        let worst_aqi = worst.reading.air_quality_index;
        let level = AlertLevel::assess(worst_aqi);
        let banner = Banner {
            level,
            message: level.message(worst_aqi),
            sensor: worst.id.clone(),
        };

        let city = stats::mean_per_tick(&snapshots);
        let kpis = [
            Metric::Temperature,
            Metric::AirQualityIndex,
            Metric::TrafficDensity,
            Metric::EnergyConsumption,
        ]
        .into_iter()
        .filter_map(|metric| {
            stats::window_stats(&city, metric, TimeWindow::FiveMinutes, timestamp_ms).map(
                |stats| Kpi {
                    metric,
                    unit: metric.unit(),
                    stats,
                },
            )
        })
        .collect();

        let sentiment = SentimentBreakdown::tally(
            snapshots
                .iter()
                .flatten()
                .filter(|r| TimeWindow::FiveMinutes.contains(r.timestamp_ms, timestamp_ms)),
        );

        Ok(Some(Self {
            tick: generator.tick_count(),
            timestamp_ms,
            banner,
            kpis,
            sentiment,
            sensors: rows,
            aqi_vs_traffic: stats::correlate(
                &recent,
                Metric::TrafficDensity,
                Metric::AirQualityIndex,
            ),
        }))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[Tick {}] {} ms | {} ({})",
            self.tick, self.timestamp_ms, self.banner.message, self.banner.sensor
        )?;

        for kpi in &self.kpis {
            write!(
                f,
                "  {:<18} {:>8.1} {:<4} (5m avg {:.1}, min {:.1}, max {:.1}",
                kpi.metric.label(),
                kpi.stats.latest,
                kpi.unit,
                kpi.stats.mean,
                kpi.stats.min,
                kpi.stats.max
            )?;
            match kpi.stats.delta {
                Some(delta) => writeln!(f, ", {delta:+.1} from last)")?,
                None => writeln!(f, ")")?,
            }
        }

        write!(f, "  Citizen sentiment (5m)")?;
        for level in SentimentLevel::ALL {
            write!(
                f,
                " {} {:.0}%",
                level.label(),
                100.0 * self.sentiment.share(level)
            )?;
        }
        writeln!(f)?;

        for row in &self.sensors {
            let r = &row.reading;
            writeln!(
                f,
                "  {:<18} {:>5.1}°C {:>3.0}% | AQI {:>3.0} {:<30} | {:>3.0}% {:<9} {:>3.0} km/h | {:>6.0} kW{} | {:+.2} | {}",
                row.name,
                r.temperature,
                r.humidity,
                r.air_quality_index,
                row.aqi_band,
                r.traffic_density,
                row.traffic.label(),
                r.vehicle_speed,
                r.energy_consumption,
                if row.energy_over_threshold { "!" } else { " " },
                r.sentiment_score,
                row.kind.label()
            )?;
        }

        match &self.aqi_vs_traffic {
            Some(trend) => write!(
                f,
                "  AQI vs traffic: {:+.2} AQI per % (r = {:.2}, n = {})",
                trend.slope, trend.correlation, trend.count
            ),
            None => write!(f, "  AQI vs traffic: not enough data"),
        }
    }
}
