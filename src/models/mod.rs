//! Data models for vaderprat
//!
//! - Location: coordinates and where they came from
//! - Weather: the reading and its receipt lines
//! - Icebreaker: cards and the required-mention vocabulary

pub mod icebreaker;
pub mod location;
pub mod weather;

pub use icebreaker::{IcebreakerCard, RequiredMention};
pub use location::{Coordinate, LocationSource, ResolvedLocation};
pub use weather::{Receipt, WeatherReading};
