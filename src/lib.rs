//! `vaderprat` - weather small talk for the current hour
//!
//! Resolves a coordinate (share link, device location or fallback), reads
//! the current and same-hour-yesterday conditions from Open-Meteo, and
//! turns them into a weather receipt plus three icebreaker cards.

pub mod api;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod icebreaker;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod render;
pub mod session;
pub mod state;
pub mod time_alignment;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::VaderpratConfig;
pub use error::{ClipboardError, LocationError, VaderpratError, WeatherError};
pub use location_resolver::{Geolocator, IpGeolocator, LocationResolver};
pub use models::{Coordinate, IcebreakerCard, LocationSource, Receipt, ResolvedLocation, WeatherReading};
pub use session::{Services, Session};
pub use state::{AppState, Effect, Event};
pub use time_alignment::HourKeys;
pub use weather::{OpenMeteoClient, WeatherService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, VaderpratError>;
