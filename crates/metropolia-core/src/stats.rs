//! Statistics over buffered readings
//!
//! Summaries for the KPI cards ([`window_stats`]), city-wide averages across
//! sensors ([`mean_per_tick`]) and least-squares fits for the correlation
//! chart ([`linear_trend`], [`correlate`]).

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reading::Reading;

/// One numeric field of a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AirQualityIndex,
    TrafficDensity,
    VehicleSpeed,
    EnergyConsumption,
    SentimentScore,
    Temperature,
    Humidity,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::AirQualityIndex,
        Metric::TrafficDensity,
        Metric::VehicleSpeed,
        Metric::EnergyConsumption,
        Metric::SentimentScore,
        Metric::Temperature,
        Metric::Humidity,
    ];

    /// Extract this metric from a reading.
    pub fn value(self, reading: &Reading) -> f64 {
        match self {
            Self::AirQualityIndex => reading.air_quality_index,
            Self::TrafficDensity => reading.traffic_density,
            Self::VehicleSpeed => reading.vehicle_speed,
            Self::EnergyConsumption => reading.energy_consumption,
            Self::SentimentScore => reading.sentiment_score,
            Self::Temperature => reading.temperature,
            Self::Humidity => reading.humidity,
        }
    }

    fn value_mut(self, reading: &mut Reading) -> &mut f64 {
        match self {
            Self::AirQualityIndex => &mut reading.air_quality_index,
            Self::TrafficDensity => &mut reading.traffic_density,
            Self::VehicleSpeed => &mut reading.vehicle_speed,
            Self::EnergyConsumption => &mut reading.energy_consumption,
            Self::SentimentScore => &mut reading.sentiment_score,
            Self::Temperature => &mut reading.temperature,
            Self::Humidity => &mut reading.humidity,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AirQualityIndex => "Air Quality",
            Self::TrafficDensity => "Traffic Density",
            Self::VehicleSpeed => "Vehicle Speed",
            Self::EnergyConsumption => "Energy Use",
            Self::SentimentScore => "Citizen Sentiment",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::AirQualityIndex => "AQI",
            Self::TrafficDensity => "%",
            Self::VehicleSpeed => "km/h",
            Self::EnergyConsumption => "kW",
            Self::SentimentScore => "",
            Self::Temperature => "°C",
            Self::Humidity => "%",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time window for aggregation, ending at a caller-supplied "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    OneMinute,
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
    /// Everything still buffered.
    All,
}

impl TimeWindow {
    /// Short label for display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::All => "all",
        }
    }

    /// Window length in milliseconds, `None` for [`TimeWindow::All`].
    pub const fn duration_ms(self) -> Option<u64> {
        match self {
            Self::OneMinute => Some(60_000),
            Self::FiveMinutes => Some(300_000),
            Self::ThirtyMinutes => Some(1_800_000),
            Self::OneHour => Some(3_600_000),
            Self::All => None,
        }
    }

    /// Whether a timestamp falls inside the window ending at `now_ms`.
    pub fn contains(self, timestamp_ms: u64, now_ms: u64) -> bool {
        if timestamp_ms > now_ms {
            return false;
        }
        match self.duration_ms() {
            Some(duration) => now_ms - timestamp_ms <= duration,
            None => true,
        }
    }
}

/// Summary of one metric over a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub latest: f64,
    /// Change from the previous reading in the window.
    pub delta: Option<f64>,
}

/// Summarize `metric` over the readings inside `window`.
///
/// `readings` must be oldest first, as returned by a snapshot.
pub fn window_stats(
    readings: &[Reading],
    metric: Metric,
    window: TimeWindow,
    now_ms: u64,
) -> Option<WindowStats> {
    let mut values = readings
        .iter()
        .filter(|r| window.contains(r.timestamp_ms, now_ms))
        .map(|r| metric.value(r));

    let first = values.next()?;
    let mut stats = WindowStats {
        count: 1,
        mean: 0.0,
        min: first,
        max: first,
        latest: first,
        delta: None,
    };
    let mut sum = first;

    for value in values {
        stats.count += 1;
        sum += value;
        stats.min = stats.min.min(value);
        stats.max = stats.max.max(value);
        stats.delta = Some(value - stats.latest);
        stats.latest = value;
    }

    stats.mean = sum / stats.count as f64;
    Some(stats)
}

/// Average several sensors' snapshots into one city-wide reading per tick.
///
/// Readings are grouped by tick sequence, so each output reading is the
/// mean of every sensor's reading for that tick. The output is oldest
/// first and keeps the latest timestamp seen for each tick.
pub fn mean_per_tick(snapshots: &[Vec<Reading>]) -> Vec<Reading> {
    let mut ticks: BTreeMap<u64, (Reading, usize)> = BTreeMap::new();

    for reading in snapshots.iter().flatten() {
        match ticks.get_mut(&reading.sequence) {
            Some((sum, count)) => {
                for metric in Metric::ALL {
                    *metric.value_mut(sum) += metric.value(reading);
                }
                sum.timestamp_ms = sum.timestamp_ms.max(reading.timestamp_ms);
                *count += 1;
            }
            None => {
                ticks.insert(reading.sequence, (*reading, 1));
            }
        }
    }

    ticks
        .into_values()
        .map(|(mut sum, count)| {
            for metric in Metric::ALL {
                *metric.value_mut(&mut sum) /= count as f64;
            }
            sum
        })
        .collect()
}

/// Least-squares line `y = slope * x + intercept` with Pearson correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    /// In `[-1, 1]`; 0 when `y` is constant.
    pub correlation: f64,
    pub count: usize,
}

/// Fit a line through `points`.
///
/// Returns `None` for fewer than two points or when every `x` is equal.
pub fn linear_trend(points: &[(f64, f64)]) -> Option<LinearTrend> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|&(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|&(_, y)| y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if !(sxx > 0.0) {
        return None;
    }

    let slope = sxy / sxx;
    let correlation = if syy > 0.0 {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    Some(LinearTrend {
        slope,
        intercept: mean_y - slope * mean_x,
        correlation,
        count: points.len(),
    })
}

/// Fit `y` against `x` across `readings`.
pub fn correlate(readings: &[Reading], x: Metric, y: Metric) -> Option<LinearTrend> {
    let points: Vec<_> = readings
        .iter()
        .map(|r| (x.value(r), y.value(r)))
        .collect();
    linear_trend(&points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sequence: u64, timestamp_ms: u64, aqi: f64, traffic: f64) -> Reading {
        Reading {
            sequence,
            timestamp_ms,
            air_quality_index: aqi,
            traffic_density: traffic,
            vehicle_speed: 50.0,
            energy_consumption: 500.0,
            sentiment_score: 0.1,
            temperature: 20.0,
            humidity: 55.0,
        }
    }

    #[test]
    fn test_metric_value_and_labels() {
        let r = reading(1, 0, 42.0, 17.0);
        assert_eq!(Metric::AirQualityIndex.value(&r), 42.0);
        assert_eq!(Metric::TrafficDensity.value(&r), 17.0);
        assert_eq!(Metric::Humidity.value(&r), 55.0);
        assert_eq!(Metric::VehicleSpeed.unit(), "km/h");
        assert_eq!(Metric::EnergyConsumption.to_string(), "Energy Use");
        assert_eq!(Metric::ALL.len(), 7);
    }

    #[test]
    fn test_time_window_contains() {
        let now = 1_000_000;
        assert!(TimeWindow::OneMinute.contains(now - 60_000, now));
        assert!(!TimeWindow::OneMinute.contains(now - 60_001, now));
        assert!(!TimeWindow::OneHour.contains(now + 1, now));
        assert!(TimeWindow::All.contains(0, now));
        assert_eq!(TimeWindow::ThirtyMinutes.label(), "30m");
        assert_eq!(TimeWindow::All.duration_ms(), None);
    }

    #[test]
    fn test_window_stats() {
        let readings: Vec<_> = (0..10)
            .map(|i| reading(i + 1, i * 10_000, 10.0 * (i + 1) as f64, 0.0))
            .collect();
        let now = 90_000;

        let all = window_stats(&readings, Metric::AirQualityIndex, TimeWindow::All, now).unwrap();
        assert_eq!(all.count, 10);
        assert_eq!(all.mean, 55.0);
        assert_eq!(all.min, 10.0);
        assert_eq!(all.max, 100.0);
        assert_eq!(all.latest, 100.0);
        assert_eq!(all.delta, Some(10.0));

        // 30 s .. 90 s
        let minute =
            window_stats(&readings, Metric::AirQualityIndex, TimeWindow::OneMinute, now).unwrap();
        assert_eq!(minute.count, 7);
        assert_eq!(minute.min, 40.0);
    }

    #[test]
    fn test_window_stats_single_and_empty() {
        let readings = [reading(1, 5_000, 33.0, 0.0)];
        let stats =
            window_stats(&readings, Metric::AirQualityIndex, TimeWindow::FiveMinutes, 5_000)
                .unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.delta, None);

        assert!(window_stats(&[], Metric::AirQualityIndex, TimeWindow::All, 0).is_none());
        // Everything too old
        assert!(
            window_stats(&readings, Metric::AirQualityIndex, TimeWindow::OneMinute, 900_000)
                .is_none()
        );
    }

    #[test]
    fn test_mean_per_tick_averages_across_sensors() {
        let north: Vec<_> = (1..=3).map(|i| reading(i, i * 5_000, 40.0 + i as f64, 10.0)).collect();
        let south: Vec<_> = (1..=3).map(|i| reading(i, i * 5_000, 60.0 + i as f64, 30.0)).collect();

        let city = mean_per_tick(&[north, south]);
        assert_eq!(city.len(), 3);
        assert_eq!(city.iter().map(|r| r.sequence).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(city[2].timestamp_ms, 15_000);
        assert_eq!(city[2].air_quality_index, 53.0);
        assert_eq!(city[0].traffic_density, 20.0);
        assert_eq!(city[0].humidity, 55.0);

        // Latest and delta now describe the whole city
        let stats = window_stats(&city, Metric::AirQualityIndex, TimeWindow::All, 15_000).unwrap();
        assert_eq!(stats.latest, 53.0);
        assert_eq!(stats.delta, Some(1.0));
    }

    #[test]
    fn test_mean_per_tick_with_uneven_history() {
        let long: Vec<_> = (1..=3).map(|i| reading(i, i * 5_000, 10.0, 0.0)).collect();
        let short = vec![reading(3, 15_000, 30.0, 0.0)];

        let city = mean_per_tick(&[long, short]);
        assert_eq!(city[0].air_quality_index, 10.0);
        assert_eq!(city[2].air_quality_index, 20.0);
        assert!(mean_per_tick(&[]).is_empty());
    }

    #[test]
    fn test_linear_trend_exact_fit() {
        let points: Vec<_> = (0..5).map(|x| (x as f64, 2.0 * x as f64 + 1.0)).collect();
        let trend = linear_trend(&points).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-12);
        assert!((trend.intercept - 1.0).abs() < 1e-12);
        assert!((trend.correlation - 1.0).abs() < 1e-12);
        assert_eq!(trend.count, 5);
    }

    #[test]
    fn test_linear_trend_degenerate_inputs() {
        assert!(linear_trend(&[]).is_none());
        assert!(linear_trend(&[(1.0, 2.0)]).is_none());
        assert!(linear_trend(&[(3.0, 1.0), (3.0, 5.0), (3.0, 9.0)]).is_none());

        let flat = linear_trend(&[(0.0, 4.0), (1.0, 4.0), (2.0, 4.0)]).unwrap();
        assert_eq!(flat.slope, 0.0);
        assert_eq!(flat.correlation, 0.0);
        assert_eq!(flat.intercept, 4.0);
    }

    #[test]
    fn test_correlate_negative_relationship() {
        let readings: Vec<_> = (0..20)
            .map(|i| reading(i + 1, i * 5_000, 200.0 - 3.0 * i as f64, i as f64 * 4.0))
            .collect();
        let trend = correlate(&readings, Metric::TrafficDensity, Metric::AirQualityIndex).unwrap();
        assert!(trend.slope < 0.0);
        assert!(trend.correlation < -0.99);
    }
}
