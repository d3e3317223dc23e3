//! Configuration management for `vaderprat`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::VaderpratError;
use crate::models::Coordinate;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaderpratConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Location resolution configuration
    #[serde(default)]
    pub location: LocationConfig,
    /// Share link configuration
    #[serde(default)]
    pub share: ShareConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Current-period forecast endpoint
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Prior-day archive endpoint
    #[serde(default = "default_archive_url")]
    pub archive_url: String,
    /// IANA timezone both datasets and the hour keys use
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// Location resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Off means the device has no position to offer
    #[serde(default = "default_geolocation_enabled")]
    pub geolocation_enabled: bool,
    /// IP geolocation endpoint answering `{"loc": "lat,lon"}`
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,
    /// Upper bound on waiting for geolocation
    #[serde(default = "default_geolocation_timeout")]
    pub geolocation_timeout_seconds: u32,
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,
}

/// Share link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Page URL that `lat`/`lon` are appended to
    #[serde(default = "default_share_base_url")]
    pub base_url: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com/v1/archive".to_string()
}

fn default_timezone() -> String {
    "Europe/Stockholm".to_string()
}

fn default_weather_timeout() -> u32 {
    15
}

fn default_geolocation_enabled() -> bool {
    true
}

fn default_geolocation_url() -> String {
    "https://ipinfo.io/json".to_string()
}

fn default_geolocation_timeout() -> u32 {
    8
}

fn default_fallback_latitude() -> f64 {
    Coordinate::STOCKHOLM.latitude
}

fn default_fallback_longitude() -> f64 {
    Coordinate::STOCKHOLM.longitude
}

fn default_share_base_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            archive_url: default_archive_url(),
            timezone: default_timezone(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geolocation_enabled: default_geolocation_enabled(),
            geolocation_url: default_geolocation_url(),
            geolocation_timeout_seconds: default_geolocation_timeout(),
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: default_share_base_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for VaderpratConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            share: ShareConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WeatherConfig {
    /// Parse the configured timezone
    pub fn timezone(&self) -> crate::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| VaderpratError::config(format!("Unknown timezone '{}'", self.timezone)))
    }
}

impl LocationConfig {
    /// The coordinate used when URL and geolocation both fail
    pub fn fallback(&self) -> crate::Result<Coordinate> {
        Coordinate::new(self.fallback_latitude, self.fallback_longitude)
    }
}

impl VaderpratConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // VADERPRAT__WEATHER__TIMEZONE=Europe/Oslo
        builder = builder.add_source(
            Environment::with_prefix("VADERPRAT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: VaderpratConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vaderprat").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.forecast_url.is_empty() {
            self.weather.forecast_url = default_forecast_url();
        }
        if self.weather.archive_url.is_empty() {
            self.weather.archive_url = default_archive_url();
        }
        if self.weather.timezone.is_empty() {
            self.weather.timezone = default_timezone();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.location.geolocation_url.is_empty() {
            self.location.geolocation_url = default_geolocation_url();
        }
        if self.location.geolocation_timeout_seconds == 0 {
            self.location.geolocation_timeout_seconds = default_geolocation_timeout();
        }
        if self.share.base_url.is_empty() {
            self.share.base_url = default_share_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(VaderpratError::config("Weather API timeout cannot exceed 300 seconds").into());
        }

        if self.location.geolocation_timeout_seconds > 60 {
            return Err(
                VaderpratError::config("Geolocation timeout cannot exceed 60 seconds").into(),
            );
        }

        self.location
            .fallback()
            .map_err(|e| VaderpratError::config(format!("Invalid fallback coordinate: {e}")))?;

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(VaderpratError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(VaderpratError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        self.weather.timezone()?;

        for (name, url) in [
            ("Forecast", &self.weather.forecast_url),
            ("Archive", &self.weather.archive_url),
            ("Geolocation", &self.location.geolocation_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(VaderpratError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        url::Url::parse(&self.share.base_url)
            .with_context(|| format!("Share base URL '{}' is not a URL", self.share.base_url))?;

        Ok(())
    }
}
