//! Location model for geographic coordinates and where they came from

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::VaderpratError;

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, -90..=90
    pub latitude: f64,
    /// Longitude in decimal degrees, -180..=180
    pub longitude: f64,
}

impl Coordinate {
    /// Central Stockholm, used when nothing better is known
    pub const STOCKHOLM: Coordinate = Coordinate {
        latitude: 59.3293,
        longitude: 18.0686,
    };

    /// Create a coordinate, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(VaderpratError::validation(format!(
                "coordinates must be finite numbers, got ({latitude}, {longitude})"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(VaderpratError::validation(format!(
                "latitude {latitude} is outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(VaderpratError::validation(format!(
                "longitude {longitude} is outside -180..=180"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Where the active coordinate came from. Display only.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationSource {
    #[serde(rename = "GPS")]
    Gps,
    #[serde(rename = "URL")]
    Url,
    #[serde(rename = "fallback")]
    Fallback,
    #[default]
    #[serde(rename = "not set")]
    NotSet,
}

impl LocationSource {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gps => "GPS",
            Self::Url => "URL",
            Self::Fallback => "fallback",
            Self::NotSet => "not set",
        }
    }
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of location resolution
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub source: LocationSource,
    /// Message of the failure that forced the fallback, if any
    pub error: Option<String>,
}

impl ResolvedLocation {
    #[must_use]
    pub fn from_url(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            source: LocationSource::Url,
            error: None,
        }
    }

    #[must_use]
    pub fn from_gps(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            source: LocationSource::Gps,
            error: None,
        }
    }

    #[must_use]
    pub fn fallback<S: Into<String>>(coordinate: Coordinate, reason: S) -> Self {
        Self {
            coordinate,
            source: LocationSource::Fallback,
            error: Some(reason.into()),
        }
    }
}
