//! Quality assessment for sensor readings
//!
//! This module turns raw values into the levels the dashboard colours and
//! alerts on: AQI threshold bands, the city alert banner, traffic
//! congestion and energy load.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reading::AIR_QUALITY_INDEX;

/// AQI above which sensitive groups are advised to limit outdoor activity.
pub const ADVISORY_AQI: f64 = 100.0;

/// AQI above which the dashboard raises an unhealthy-air alert.
pub const ALERT_AQI: f64 = 150.0;

/// Energy draw (kW) above which the load gauge trips its threshold marker.
pub const ENERGY_THRESHOLD_KW: f64 = 800.0;

/// One AQI threshold band: values up to and including `upper_bound`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiBand {
    pub upper_bound: f64,
    pub label: String,
    /// `#RRGGBB` display colour.
    pub color: String,
}

impl AqiBand {
    pub fn new(upper_bound: f64, label: &str, color: &str) -> Self {
        Self {
            upper_bound,
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Standard US EPA bands, Good through Hazardous.
pub fn default_aqi_bands() -> Vec<AqiBand> {
    vec![
        AqiBand::new(50.0, "Good", "#00E400"),
        AqiBand::new(100.0, "Moderate", "#FFFF00"),
        AqiBand::new(150.0, "Unhealthy for Sensitive Groups", "#FF7E00"),
        AqiBand::new(200.0, "Unhealthy", "#FF0000"),
        AqiBand::new(300.0, "Very Unhealthy", "#8F3F97"),
        AqiBand::new(500.0, "Hazardous", "#7E0023"),
    ]
}

/// Validated, ordered set of AQI bands covering the whole AQI domain.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiScale {
    bands: Vec<AqiBand>,
}

impl AqiScale {
    /// Build a scale from bands ordered by strictly increasing upper bound.
    ///
    /// The last band must reach the AQI ceiling so every value classifies.
    pub fn new(bands: Vec<AqiBand>) -> Result<Self, ConfigError> {
        let mut previous = f64::NEG_INFINITY;
        for band in &bands {
            // Also rejects NaN bounds
            if !(band.upper_bound > previous) || !band.upper_bound.is_finite() {
                return Err(ConfigError::UnorderedAqiBands {
                    label: band.label.clone(),
                    upper_bound: band.upper_bound,
                });
            }
            if !is_hex_color(&band.color) {
                return Err(ConfigError::InvalidColor {
                    label: band.label.clone(),
                    color: band.color.clone(),
                });
            }
            previous = band.upper_bound;
        }

        match bands.last() {
            None => Err(ConfigError::NoAqiBands),
            Some(last) if last.upper_bound < AIR_QUALITY_INDEX.max => Err(
                ConfigError::IncompleteAqiBands(last.upper_bound, AIR_QUALITY_INDEX.max),
            ),
            Some(_) => Ok(Self { bands }),
        }
    }

    /// Band containing `aqi`; values past the last bound map to the last band.
    pub fn classify(&self, aqi: f64) -> &AqiBand {
        self.bands
            .iter()
            .find(|band| aqi <= band.upper_bound)
            .unwrap_or(&self.bands[self.bands.len() - 1])
    }

    pub fn bands(&self) -> &[AqiBand] {
        &self.bands
    }
}

impl Default for AqiScale {
    fn default() -> Self {
        Self {
            bands: default_aqi_bands(),
        }
    }
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// City alert banner state driven by the current AQI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Nominal,
    Advisory,
    Alert,
}

impl AlertLevel {
    pub fn assess(aqi: f64) -> Self {
        if aqi > ALERT_AQI {
            Self::Alert
        } else if aqi > ADVISORY_AQI {
            Self::Advisory
        } else {
            Self::Nominal
        }
    }

    /// Banner text for this level at the given AQI.
    pub fn message(self, aqi: f64) -> String {
        match self {
            Self::Nominal => "All systems nominal".into(),
            Self::Advisory => format!(
                "Advisory: AQI at {aqi:.0} - Sensitive groups should limit outdoor activity"
            ),
            Self::Alert => format!("ALERT: AQI at {aqi:.0} - Unhealthy levels detected"),
        }
    }
}

/// Road congestion level for a traffic density percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    Free,
    Busy,
    Congested,
}

impl TrafficLevel {
    pub fn assess(density: f64) -> Self {
        if density > 75.0 {
            Self::Congested
        } else if density > 50.0 {
            Self::Busy
        } else {
            Self::Free
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free flow",
            Self::Busy => "Busy",
            Self::Congested => "Congested",
        }
    }
}

/// Power draw level for the load gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLoad {
    Low,
    Elevated,
    High,
}

impl EnergyLoad {
    pub fn assess(kw: f64) -> Self {
        if kw < 400.0 {
            Self::Low
        } else if kw < 700.0 {
            Self::Elevated
        } else {
            Self::High
        }
    }

    pub fn exceeds_threshold(kw: f64) -> bool {
        kw > ENERGY_THRESHOLD_KW
    }
}

/// Scores above this count as positive citizen feedback.
pub const POSITIVE_SENTIMENT: f64 = 0.1;

/// Scores below this count as negative citizen feedback.
pub const NEGATIVE_SENTIMENT: f64 = -0.1;

/// Citizen feedback category for a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLevel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLevel {
    pub const ALL: [SentimentLevel; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Scores within `[-0.1, 0.1]` are neutral.
    pub fn assess(score: f64) -> Self {
        if score > POSITIVE_SENTIMENT {
            Self::Positive
        } else if score < NEGATIVE_SENTIMENT {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }

    /// Donut slice colour as `#RRGGBB`.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Positive => "#10B981",
            Self::Neutral => "#64748B",
            Self::Negative => "#EF4444",
        }
    }
}
