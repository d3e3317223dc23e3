//! Location Resolution Module
//!
//! Resolves the coordinate to fetch weather for, in priority order:
//! `lat`/`lon` query parameters on the page URL, the device geolocation
//! capability (bounded by a timeout), and finally a fixed fallback.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::LocationConfig;
use crate::error::LocationError;
use crate::models::{Coordinate, ResolvedLocation};

/// Device geolocation capability
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Current position, low accuracy, never from a cache
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Geolocation through an IP lookup service (`{"loc": "lat,lon"}`)
pub struct IpGeolocator {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    loc: Option<String>,
}

impl IpGeolocator {
    pub fn new(config: &LocationConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.geolocation_timeout_seconds.into()))
            .user_agent(concat!("vaderprat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::VaderpratError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.geolocation_url.clone(),
        })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        debug!("Looking up position from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await
            .map_err(|e| LocationError::timeout_or_denied(format!("Location lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LocationError::timeout_or_denied(format!(
                "Location lookup denied with status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::timeout_or_denied(format!("Location lookup failed: {e}")))?;

        body.loc
            .as_deref()
            .and_then(parse_loc)
            .ok_or_else(|| LocationError::timeout_or_denied("Location lookup returned no position."))
    }
}

/// Stand-in for platforms without any geolocation capability
pub struct UnsupportedGeolocator;

#[async_trait]
impl Geolocator for UnsupportedGeolocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}

fn parse_loc(loc: &str) -> Option<Coordinate> {
    let (lat, lon) = loc.split_once(',')?;
    parse_pair(lat.trim(), lon.trim())
}

fn parse_pair(lat: &str, lon: &str) -> Option<Coordinate> {
    let latitude = lat.parse::<f64>().ok()?;
    let longitude = lon.parse::<f64>().ok()?;
    Coordinate::new(latitude, longitude).ok()
}

/// Coordinate from the `lat`/`lon` query parameters, when both are present and valid
#[must_use]
pub fn coordinate_from_query(url: &Url) -> Option<Coordinate> {
    let lat = url.query_pairs().find(|(k, _)| k == "lat").map(|(_, v)| v)?;
    let lon = url.query_pairs().find(|(k, _)| k == "lon").map(|(_, v)| v)?;
    if lat.is_empty() || lon.is_empty() {
        return None;
    }
    parse_pair(lat.trim(), lon.trim())
}

/// `base` with `lat` and `lon` set to the coordinate; other parameters are kept
#[must_use]
pub fn share_url(base: &Url, coordinate: Coordinate) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != "lat" && k != "lon")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.extend_pairs(kept);
        pairs.append_pair("lat", &coordinate.latitude.to_string());
        pairs.append_pair("lon", &coordinate.longitude.to_string());
    }
    url
}

/// Service for resolving where the user is
pub struct LocationResolver {
    fallback: Coordinate,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(config: &LocationConfig) -> crate::Result<Self> {
        Ok(Self {
            fallback: config.fallback()?,
            timeout: Duration::from_secs(config.geolocation_timeout_seconds.into()),
        })
    }

    #[must_use]
    pub fn with_timeout(fallback: Coordinate, timeout: Duration) -> Self {
        Self { fallback, timeout }
    }

    /// URL parameters first, then the device, then the fallback
    #[instrument(skip(self, geolocator))]
    pub async fn resolve(&self, page_url: Option<&Url>, geolocator: &dyn Geolocator) -> ResolvedLocation {
        if let Some(coordinate) = page_url.and_then(coordinate_from_query) {
            debug!("Using coordinate from URL: {}", coordinate.format_coordinates());
            return ResolvedLocation::from_url(coordinate);
        }
        self.locate_device(geolocator).await
    }

    /// Ask the device, falling back when it fails or takes too long
    pub async fn locate_device(&self, geolocator: &dyn Geolocator) -> ResolvedLocation {
        let outcome = match tokio::time::timeout(self.timeout, geolocator.current_position()).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::timeout_or_denied(format!(
                "Location request timed out after {:?}.",
                self.timeout
            ))),
        };

        match outcome {
            Ok(coordinate) => {
                info!("Device position: {}", coordinate.format_coordinates());
                ResolvedLocation::from_gps(coordinate)
            }
            Err(e) => {
                warn!("Geolocation failed, using fallback: {}", e);
                ResolvedLocation::fallback(self.fallback, e.to_string())
            }
        }
    }
}
