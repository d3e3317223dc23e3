//! Open-Meteo forecast and archive client
//!
//! Both endpoints are asked for the same three hourly variables in the same
//! timezone. The two requests run concurrently and the first failure wins.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::WeatherService;
use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::models::{Coordinate, WeatherReading};
use crate::time_alignment::HourKeys;

/// Hourly variables requested from both endpoints
pub const HOURLY_VARS: &str = "temperature_2m,precipitation_probability,windspeed_10m";

const FORECAST: &str = "forecast";
const ARCHIVE: &str = "archive";

const TEMPERATURE: &str = "temperature_2m";
const RAIN_PROBABILITY: &str = "precipitation_probability";
const WIND_SPEED: &str = "windspeed_10m";

/// Top-level response of either endpoint; only the hourly block is used
#[derive(Debug, Deserialize, Default)]
pub struct HourlyResponse {
    pub hourly: Option<HourlyPayload>,
}

/// Hourly series. Values stay untyped so a `null` or a string in the
/// middle of a series is reported as an invalid value, not a parse failure.
#[derive(Debug, Deserialize, Default)]
pub struct HourlyPayload {
    pub time: Option<Vec<String>>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Option<Vec<Value>>,
    pub precipitation_probability: Option<Vec<Value>>,
    #[serde(rename = "windspeed_10m")]
    pub wind_speed: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct HourlyQuery<'a> {
    latitude: f64,
    longitude: f64,
    hourly: &'a str,
    timezone: &'a str,
    wind_speed_unit: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
}

/// Weather API client for Open-Meteo
pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    archive_url: String,
    timezone: Tz,
}

impl OpenMeteoClient {
    /// Create a new client from configuration
    pub fn new(config: &WeatherConfig) -> crate::Result<Self> {
        let timezone = config.timezone()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("vaderprat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::VaderpratError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            forecast_url: config.forecast_url.clone(),
            archive_url: config.archive_url.clone(),
            timezone,
        })
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Fetch both datasets and read them at the given hour keys
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn fetch_reading_at(
        &self,
        coordinate: Coordinate,
        keys: &HourKeys,
    ) -> Result<WeatherReading, WeatherError> {
        let start_time = Instant::now();
        let timezone = self.timezone.name();

        let forecast_query = HourlyQuery {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            hourly: HOURLY_VARS,
            timezone,
            wind_speed_unit: "ms",
            start_date: None,
            end_date: None,
        };
        let yesterday = keys.yesterday.format("%Y-%m-%d").to_string();
        let archive_query = HourlyQuery {
            start_date: Some(yesterday.clone()),
            end_date: Some(yesterday),
            ..forecast_query
        };

        let (forecast, archive) = tokio::try_join!(
            self.get_dataset(FORECAST, &self.forecast_url, &forecast_query),
            self.get_dataset(ARCHIVE, &self.archive_url, &archive_query),
        )?;

        let reading = extract_reading(&forecast, &archive, keys)?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved weather for {} in {:.3}s",
            coordinate.format_coordinates(),
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!("Slow weather response: {:.3}s", total_duration.as_secs_f64());
        }

        Ok(reading)
    }

    async fn get_dataset(
        &self,
        dataset: &'static str,
        url: &str,
        query: &HourlyQuery<'_>,
    ) -> Result<HourlyResponse, WeatherError> {
        debug!("Requesting {} dataset from {}", dataset, url);

        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} dataset answered with {}", dataset, status);
            return Err(WeatherError::Status {
                dataset,
                status: status.as_u16(),
            });
        }

        response
            .json::<HourlyResponse>()
            .await
            .map_err(|e| WeatherError::transport(format!("unreadable {dataset} response: {e}")))
    }
}

#[async_trait]
impl WeatherService for OpenMeteoClient {
    async fn fetch_reading(&self, coordinate: Coordinate) -> Result<WeatherReading, WeatherError> {
        let keys = HourKeys::now(self.timezone)
            .map_err(|e| WeatherError::transport(e.to_string()))?;
        self.fetch_reading_at(coordinate, &keys).await
    }
}

/// Reduce the two datasets to a reading at `keys`.
///
/// Both payloads must be present before any index is looked up, and every
/// scalar must be a finite number.
pub fn extract_reading(
    forecast: &HourlyResponse,
    archive: &HourlyResponse,
    keys: &HourKeys,
) -> Result<WeatherReading, WeatherError> {
    let forecast = forecast
        .hourly
        .as_ref()
        .ok_or(WeatherError::DataMissing { dataset: FORECAST })?;
    let archive = archive
        .hourly
        .as_ref()
        .ok_or(WeatherError::DataMissing { dataset: ARCHIVE })?;

    let today_index = hour_index(forecast, FORECAST, &keys.current)?;
    let yesterday_index = hour_index(archive, ARCHIVE, &keys.previous)?;

    let temp_now = value_at(forecast.temperature.as_deref(), TEMPERATURE, today_index)?;
    let temp_yesterday = value_at(archive.temperature.as_deref(), TEMPERATURE, yesterday_index)?;
    let wind_now = value_at(forecast.wind_speed.as_deref(), WIND_SPEED, today_index)?;
    let rain_prob_now = value_at(
        forecast.precipitation_probability.as_deref(),
        RAIN_PROBABILITY,
        today_index,
    )?;

    WeatherReading::new(temp_now, temp_yesterday, wind_now, rain_prob_now).ok_or(
        WeatherError::ValueInvalid {
            series: TEMPERATURE,
            index: today_index,
        },
    )
}

/// First position of `key` in the payload's timestamps
fn hour_index(payload: &HourlyPayload, dataset: &'static str, key: &str) -> Result<usize, WeatherError> {
    let times = payload
        .time
        .as_ref()
        .ok_or(WeatherError::DataMissing { dataset })?;

    times
        .iter()
        .position(|t| t == key)
        .ok_or_else(|| WeatherError::TimestampMismatch {
            dataset,
            key: key.to_string(),
        })
}

fn value_at(series: Option<&[Value]>, name: &'static str, index: usize) -> Result<f64, WeatherError> {
    series
        .and_then(|values| values.get(index))
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or(WeatherError::ValueInvalid {
            series: name,
            index,
        })
}
