use std::fmt;

use serde::{Deserialize, Serialize};

/// A place resolved from free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.4}, {:.4})", self.display_name, self.latitude, self.longitude)
    }
}

/// Current conditions for a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// Label of the place, e.g. "Stockholm, Stockholms kommun, Sverige".
    pub city: String,
    pub temperature_c: f64,
    pub summary: String,
}

impl fmt::Display for WeatherInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.1}°C, {}", self.city, self.temperature_c, self.summary)
    }
}

/// Input of a point-forecast lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level.
    pub altitude: Option<f64>,
    /// Label for the result; defaults to the rounded coordinates.
    pub label: Option<String>,
}

impl CoordinateQuery {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, altitude: None, label: None }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Round a coordinate to 4 decimal places, the precision MET Norway caches on.
pub fn round_coordinate(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
