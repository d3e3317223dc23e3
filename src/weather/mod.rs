//! Weather data access
//!
//! Fetches the current-period forecast and the prior-day archive for a
//! coordinate and reduces them to a single [`WeatherReading`].

use async_trait::async_trait;

use crate::error::WeatherError;
use crate::models::{Coordinate, WeatherReading};

pub mod open_meteo;

pub use open_meteo::{OpenMeteoClient, extract_reading};

/// Anything that can produce a reading for a coordinate
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Fetch "now" and "yesterday, same hour". Never retries.
    async fn fetch_reading(&self, coordinate: Coordinate) -> Result<WeatherReading, WeatherError>;
}
