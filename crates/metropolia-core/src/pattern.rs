//! Time-of-day baselines for the synthetic signals
//!
//! All curves are smooth and periodic over 24 hours so consecutive ticks
//! never jump at an hour boundary. Hours are fractional local hours in
//! `[0, 24)`.

use core::f64::consts::PI;

/// Milliseconds in one day.
pub const MS_PER_DAY: u64 = 86_400_000;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Fractional local hour for an epoch timestamp shifted by a UTC offset.
pub fn hour_of_day(timestamp_ms: u64, utc_offset_minutes: i32) -> f64 {
    let local_ms = i128::from(timestamp_ms) + i128::from(utc_offset_minutes) * 60_000;
    local_ms.rem_euclid(i128::from(MS_PER_DAY)) as f64 / MS_PER_HOUR
}

/// Shortest distance in hours between two points on the 24 h clock.
fn circular_gap(hour: f64, center: f64) -> f64 {
    let gap = (hour - center).rem_euclid(24.0);
    gap.min(24.0 - gap)
}

/// Gaussian bump centred on `center` with the given width in hours.
fn bump(hour: f64, center: f64, width: f64) -> f64 {
    let z = circular_gap(hour, center) / width;
    (-0.5 * z * z).exp()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Daily sine peaking at noon and bottoming out at midnight.
fn diurnal(hour: f64) -> f64 {
    ((hour - 6.0) * PI / 12.0).sin()
}

/// Normalized traffic level in `[0, 1]`.
///
/// A 0.2 night floor, a midday plateau around 0.5 and rush-hour peaks
/// around 0.8 at 08:00 and 18:00.
pub fn traffic_factor(hour: f64) -> f64 {
    let rush = bump(hour, 8.0, 1.2).max(bump(hour, 18.0, 1.2));
    (0.2 + 0.3 * bump(hour, 13.0, 2.5) + 0.6 * rush).clamp(0.0, 1.0)
}

/// Site power draw in kW before per-kind weighting.
///
/// Business hours (09:00 to 18:00) lift the night load, and residential
/// demand adds an evening bump.
pub fn energy_baseline(hour: f64) -> f64 {
    let business = sigmoid((hour - 9.0) * 2.0) * sigmoid((18.0 - hour) * 2.0);
    460.0 + 140.0 * business + 200.0 * bump(hour, 20.5, 1.2)
}

/// Air temperature in °C.
pub fn temperature_baseline(hour: f64) -> f64 {
    20.0 + 8.0 * diurnal(hour)
}

/// Relative humidity in percent, moving against temperature.
pub fn humidity_baseline(hour: f64) -> f64 {
    60.0 - 10.0 * diurnal(hour)
}

/// Sentiment the citizen mood drifts toward at a given AQI.
///
/// Mildly positive in clean air and falling steadily as pollution rises.
pub fn sentiment_baseline(aqi: f64) -> f64 {
    0.3 - 0.8 * (aqi / 500.0)
}

/// All time-of-day baselines for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub hour: f64,
    pub traffic_factor: f64,
    pub energy: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl Baseline {
    pub fn at(hour: f64) -> Self {
        Self {
            hour,
            traffic_factor: traffic_factor(hour),
            energy: energy_baseline(hour),
            temperature: temperature_baseline(hour),
            humidity: humidity_baseline(hour),
        }
    }
}
