//! Error types and handling for the `vaderprat` application

use thiserror::Error;

/// Failures while resolving where the user is
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// No geolocation capability is available on this device
    #[error("Geolocation is not supported on this device.")]
    Unsupported,

    /// The capability answered with an error or did not answer in time
    #[error("{message}")]
    TimeoutOrDenied { message: String },
}

impl LocationError {
    /// Create a timeout/denied error
    pub fn timeout_or_denied<S: Into<String>>(message: S) -> Self {
        Self::TimeoutOrDenied {
            message: message.into(),
        }
    }
}

/// Failures while fetching or reading the two weather datasets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// The request never produced a response
    #[error("Weather fetch failed: {message}")]
    Transport { message: String },

    /// A response came back with a non-success status
    #[error("Weather fetch failed: {dataset} answered with status {status}")]
    Status { dataset: &'static str, status: u16 },

    /// A response had no hourly payload
    #[error("Missing hourly weather data in {dataset}.")]
    DataMissing { dataset: &'static str },

    /// The hour key was not present in a dataset's timestamps
    #[error("Could not match hour {key} in {dataset} weather data.")]
    TimestampMismatch { dataset: &'static str, key: String },

    /// A scalar was missing, out of range or not a finite number
    #[error("Invalid weather value for {series} at index {index}.")]
    ValueInvalid { series: &'static str, index: usize },
}

impl WeatherError {
    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

/// The system clipboard could not be written
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {message}")]
    Unavailable { message: String },
}

impl ClipboardError {
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Main error type for the `vaderprat` application
#[derive(Error, Debug)]
pub enum VaderpratError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Location resolution errors
    #[error("Location error: {source}")]
    Location {
        #[from]
        source: LocationError,
    },

    /// Weather data errors
    #[error("Weather error: {source}")]
    Weather {
        #[from]
        source: WeatherError,
    },

    /// Clipboard errors
    #[error("Clipboard error: {source}")]
    Clipboard {
        #[from]
        source: ClipboardError,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl VaderpratError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            VaderpratError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            VaderpratError::Location { source } => source.to_string(),
            VaderpratError::Weather { source } => source.to_string(),
            VaderpratError::Clipboard { .. } => "Could not copy to the clipboard.".to_string(),
            VaderpratError::Validation { message } => format!("Invalid input: {message}"),
            VaderpratError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
