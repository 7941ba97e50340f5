//! Sensor identity and the default city deployment
//!
//! A [`Sensor`] is fixed for the lifetime of a generator: it names a site,
//! pins it to a coordinate and says what kind of infrastructure it watches.
//! The kind nudges the generated values (transport corridors see heavier
//! traffic, energy sites draw more power) without changing their bounds.

use core::borrow::Borrow;
use core::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Stable identifier of a sensor site, e.g. `downtown` or `highway_i95`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(String);

impl SensorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable form of the id: `residential_north` → `Residential North`.
    pub fn title(&self) -> String {
        self.0
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SensorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether the coordinate lies on the globe (NaN is never valid).
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// What a sensor site primarily monitors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Air quality and weather stations.
    #[default]
    Environmental,
    /// Road corridors, hubs and airports.
    Transportation,
    /// Substations and large consumers.
    Energy,
}

impl SensorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Environmental => "Environmental",
            Self::Transportation => "Transportation",
            Self::Energy => "Energy",
        }
    }

    /// Multiplier applied to the time-of-day traffic baseline.
    pub const fn traffic_weight(self) -> f64 {
        match self {
            Self::Transportation => 1.15,
            Self::Environmental | Self::Energy => 1.0,
        }
    }

    /// Multiplier applied to the time-of-day energy baseline.
    pub const fn energy_weight(self) -> f64 {
        match self {
            Self::Energy => 1.5,
            Self::Environmental | Self::Transportation => 1.0,
        }
    }
}

/// A configured sensor site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    /// Display name; the titled id is used when left blank.
    #[serde(default)]
    pub name: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub kind: SensorKind,
}

impl Sensor {
    pub fn new(id: &str, name: &str, location: GeoPoint, kind: SensorKind) -> Self {
        Self {
            id: SensorId::new(id),
            name: name.into(),
            location,
            kind,
        }
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.id.title()
        } else {
            self.name.clone()
        }
    }
}

/// The eight Metropolia sites the dashboard ships with.
pub fn default_city_sensors() -> Vec<Sensor> {
    use SensorKind::*;

    vec![
        Sensor::new("downtown", "Downtown", GeoPoint::new(40.758, -73.985), Environmental),
        Sensor::new("airport", "Airport", GeoPoint::new(40.641, -73.778), Transportation),
        Sensor::new("industrial", "Industrial", GeoPoint::new(40.689, -74.044), Energy),
        Sensor::new(
            "residential_north",
            "Residential North",
            GeoPoint::new(40.817, -73.978),
            Environmental,
        ),
        Sensor::new(
            "residential_south",
            "Residential South",
            GeoPoint::new(40.678, -73.944),
            Environmental,
        ),
        Sensor::new("highway_i95", "Highway I-95", GeoPoint::new(40.750, -73.870), Transportation),
        Sensor::new("stadium", "Stadium", GeoPoint::new(40.758, -73.848), Energy),
        Sensor::new("university", "University", GeoPoint::new(40.807, -73.962), Environmental),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_id_title() {
        assert_eq!(SensorId::new("residential_north").title(), "Residential North");
        assert_eq!(SensorId::new("highway_i95").title(), "Highway I95");
        assert_eq!(SensorId::new("__x__").title(), "X");
    }

    #[test]
    fn test_display_name_falls_back_to_title() {
        let sensor = Sensor::new("stadium_east", "  ", GeoPoint::new(0.0, 0.0), SensorKind::Energy);
        assert_eq!(sensor.display_name(), "Stadium East");
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(GeoPoint::new(40.758, -73.985).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_default_city_has_unique_valid_sites() {
        let sensors = default_city_sensors();
        assert_eq!(sensors.len(), 8);
        for (i, sensor) in sensors.iter().enumerate() {
            assert!(sensor.location.is_valid(), "{} has a bad location", sensor.id);
            assert!(sensors[i + 1..].iter().all(|other| other.id != sensor.id));
        }
    }
}
