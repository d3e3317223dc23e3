//! Page state and its transitions
//!
//! [`AppState::apply`] is a pure function: it takes the current state and
//! an [`Event`] and returns the next state plus the [`Effect`]s the caller
//! must carry out. Effects report back as new events.
//!
//! While a location or weather request is in flight (`loading`), new
//! location/weather triggers are ignored.

use serde::Serialize;
use tracing::debug;

use crate::icebreaker::{self, CARD_COUNT};
use crate::models::{Coordinate, IcebreakerCard, LocationSource, ResolvedLocation, WeatherReading};

/// Message shown when sharing is attempted before any coordinate is known
pub const NO_LOCATION_FOR_SHARE: &str = "Set location first.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    pub coordinate: Option<Coordinate>,
    pub source: LocationSource,
    pub error: Option<String>,
    pub loading: bool,
    pub weather: Option<WeatherReading>,
    pub cards: [IcebreakerCard; CARD_COUNT],
    /// Last share link handed to the clipboard
    pub copied_link: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            coordinate: None,
            source: LocationSource::NotSet,
            error: None,
            loading: false,
            weather: None,
            cards: icebreaker::default_cards(),
            copied_link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Page opened; carries the coordinate from the URL, if any
    Started { page_coordinate: Option<Coordinate> },
    /// "Use my location" pressed
    UseMyLocation,
    LocationResolved(ResolvedLocation),
    WeatherLoaded(WeatherReading),
    WeatherFailed(String),
    /// "New icebreakers" pressed
    Regenerate,
    CardsGenerated([IcebreakerCard; CARD_COUNT]),
    /// "Copy link" pressed
    CopyShareLink,
    LinkCopied(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ResolveLocation,
    FetchWeather(Coordinate),
    GenerateCards(WeatherReading),
    CopyShareLink(Coordinate),
}

impl AppState {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.loading
    }

    /// Next state and the work it asks for
    #[must_use]
    pub fn apply(self, event: Event) -> (Self, Vec<Effect>) {
        match event {
            Event::Started { page_coordinate: None } => (self, Vec::new()),
            Event::Started { page_coordinate: Some(coordinate) } => {
                if self.loading {
                    debug!("Ignoring start while a request is in flight");
                    return (self, Vec::new());
                }
                let next = Self {
                    coordinate: Some(coordinate),
                    source: LocationSource::Url,
                    error: None,
                    loading: true,
                    ..self
                };
                (next, vec![Effect::FetchWeather(coordinate)])
            }
            Event::UseMyLocation => {
                if self.loading {
                    debug!("Ignoring location request while one is in flight");
                    return (self, Vec::new());
                }
                let next = Self {
                    error: None,
                    loading: true,
                    ..self
                };
                (next, vec![Effect::ResolveLocation])
            }
            Event::LocationResolved(resolved) => {
                let coordinate = resolved.coordinate;
                let next = Self {
                    coordinate: Some(coordinate),
                    source: resolved.source,
                    error: resolved.error,
                    loading: true,
                    ..self
                };
                (next, vec![Effect::FetchWeather(coordinate)])
            }
            Event::WeatherLoaded(reading) => {
                let next = Self {
                    weather: Some(reading),
                    loading: false,
                    ..self
                };
                (next, vec![Effect::GenerateCards(reading)])
            }
            Event::WeatherFailed(message) => {
                let next = Self {
                    weather: None,
                    error: Some(message),
                    loading: false,
                    cards: icebreaker::default_cards(),
                    ..self
                };
                (next, Vec::new())
            }
            Event::Regenerate => match self.weather {
                Some(reading) => (self, vec![Effect::GenerateCards(reading)]),
                None => {
                    let next = Self {
                        cards: icebreaker::default_cards(),
                        ..self
                    };
                    (next, Vec::new())
                }
            },
            Event::CardsGenerated(cards) => (Self { cards, ..self }, Vec::new()),
            Event::CopyShareLink => match self.coordinate {
                Some(coordinate) => (self, vec![Effect::CopyShareLink(coordinate)]),
                None => {
                    let next = Self {
                        error: Some(NO_LOCATION_FOR_SHARE.to_string()),
                        ..self
                    };
                    (next, Vec::new())
                }
            },
            Event::LinkCopied(link) => (
                Self {
                    copied_link: Some(link),
                    ..self
                },
                Vec::new(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> WeatherReading {
        WeatherReading::new(12.0, 8.0, 3.0, 10.0).unwrap()
    }

    fn loaded() -> AppState {
        let coordinate = Coordinate::new(59.3, 18.1).unwrap();
        let (state, _) = AppState::default().apply(Event::Started {
            page_coordinate: Some(coordinate),
        });
        let (state, _) = state.apply(Event::WeatherLoaded(reading()));
        state
    }

    #[test]
    fn test_start_without_url_does_nothing() {
        let (state, effects) = AppState::default().apply(Event::Started { page_coordinate: None });
        assert_eq!(state, AppState::default());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_start_with_url_fetches_weather() {
        let coordinate = Coordinate::new(59.3, 18.1).unwrap();
        let (state, effects) = AppState::default().apply(Event::Started {
            page_coordinate: Some(coordinate),
        });
        assert_eq!(state.source, LocationSource::Url);
        assert!(state.loading);
        assert_eq!(effects, vec![Effect::FetchWeather(coordinate)]);
    }

    #[test]
    fn test_use_my_location_flow() {
        let (state, effects) = AppState::default().apply(Event::UseMyLocation);
        assert!(state.is_busy());
        assert_eq!(effects, vec![Effect::ResolveLocation]);

        let fallback = ResolvedLocation::fallback(Coordinate::STOCKHOLM, "denied");
        let (state, effects) = state.apply(Event::LocationResolved(fallback));
        assert_eq!(state.source, LocationSource::Fallback);
        assert_eq!(state.error.as_deref(), Some("denied"));
        assert_eq!(effects, vec![Effect::FetchWeather(Coordinate::STOCKHOLM)]);

        let (state, effects) = state.apply(Event::WeatherLoaded(reading()));
        assert!(!state.is_busy());
        assert_eq!(state.weather, Some(reading()));
        // the fallback reason stays visible after a successful fetch
        assert_eq!(state.error.as_deref(), Some("denied"));
        assert_eq!(effects, vec![Effect::GenerateCards(reading())]);
    }

    #[test]
    fn test_triggers_are_ignored_while_busy() {
        let (busy, _) = AppState::default().apply(Event::UseMyLocation);

        let (state, effects) = busy.clone().apply(Event::UseMyLocation);
        assert_eq!(state, busy);
        assert!(effects.is_empty());

        let (state, effects) = busy.clone().apply(Event::Started {
            page_coordinate: Some(Coordinate::STOCKHOLM),
        });
        assert_eq!(state, busy);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_weather_failure_resets_content() {
        let mut state = loaded();
        state.cards[0].say = "something generated".to_string();

        let (state, effects) = state.apply(Event::WeatherFailed("Weather fetch failed.".to_string()));

        assert_eq!(state.weather, None);
        assert_eq!(state.cards, icebreaker::default_cards());
        assert_eq!(state.error.as_deref(), Some("Weather fetch failed."));
        assert!(!state.loading);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_regenerate() {
        let (_, effects) = loaded().apply(Event::Regenerate);
        assert_eq!(effects, vec![Effect::GenerateCards(reading())]);

        let (state, effects) = AppState::default().apply(Event::Regenerate);
        assert_eq!(state.cards, icebreaker::default_cards());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_copy_needs_a_location() {
        let (state, effects) = AppState::default().apply(Event::CopyShareLink);
        assert_eq!(state.error.as_deref(), Some(NO_LOCATION_FOR_SHARE));
        assert!(effects.is_empty());

        let (state, effects) = loaded().apply(Event::CopyShareLink);
        assert_eq!(effects, vec![Effect::CopyShareLink(state.coordinate.unwrap())]);
    }
}
