//! Drives [`AppState`] by carrying out its effects
//!
//! Card generation runs inline against the session's RNG. Network and
//! clipboard effects go through [`Services`], either awaited in place
//! ([`Session::run`]) or spawned with their completion sent back over a
//! channel ([`Session::spawn_effects`]).

use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};
use url::Url;

use crate::VaderpratError;
use crate::clipboard::Clipboard;
use crate::config::VaderpratConfig;
use crate::icebreaker;
use crate::location_resolver::{
    Geolocator, IpGeolocator, LocationResolver, UnsupportedGeolocator, share_url,
};
use crate::models::ResolvedLocation;
use crate::state::{AppState, Effect, Event};
use crate::weather::{OpenMeteoClient, WeatherService};

/// Everything effects need from the outside world
#[derive(Clone)]
pub struct Services {
    pub weather: Arc<dyn WeatherService>,
    pub geolocator: Arc<dyn Geolocator>,
    pub resolver: Arc<LocationResolver>,
    pub clipboard: Arc<dyn Clipboard>,
    pub share_base: Url,
}

impl Services {
    /// Production services: Open-Meteo, IP geolocation and the given clipboard
    pub fn from_config(config: &VaderpratConfig, clipboard: Arc<dyn Clipboard>) -> crate::Result<Self> {
        let share_base = Url::parse(&config.share.base_url)
            .map_err(|e| VaderpratError::config(format!("Invalid share base URL: {e}")))?;
        let geolocator: Arc<dyn Geolocator> = if config.location.geolocation_enabled {
            Arc::new(IpGeolocator::new(&config.location)?)
        } else {
            Arc::new(UnsupportedGeolocator)
        };
        Ok(Self {
            weather: Arc::new(OpenMeteoClient::new(&config.weather)?),
            geolocator,
            resolver: Arc::new(LocationResolver::new(&config.location)?),
            clipboard,
            share_base,
        })
    }

    /// Page URL coordinate, else the device, else the fallback
    pub async fn resolve_location(&self, page_url: Option<&Url>) -> ResolvedLocation {
        self.resolver.resolve(page_url, self.geolocator.as_ref()).await
    }

    /// Carry out one outward-facing effect and report the outcome
    pub async fn perform(&self, effect: Effect) -> Option<Event> {
        match effect {
            // the button skips the page URL and asks the device
            Effect::ResolveLocation => Some(Event::LocationResolved(self.resolve_location(None).await)),
            Effect::FetchWeather(coordinate) => match self.weather.fetch_reading(coordinate).await {
                Ok(reading) => Some(Event::WeatherLoaded(reading)),
                Err(e) => {
                    error!("Weather fetch failed: {}", e);
                    Some(Event::WeatherFailed(e.to_string()))
                }
            },
            Effect::CopyShareLink(coordinate) => {
                let link = share_url(&self.share_base, coordinate).to_string();
                match self.clipboard.write_text(&link).await {
                    Ok(()) => {
                        info!("Share link copied via {}", self.clipboard.name());
                        Some(Event::LinkCopied(link))
                    }
                    Err(e) => {
                        error!("Copy failed: {}", e);
                        None
                    }
                }
            }
            Effect::GenerateCards(_) => None,
        }
    }
}

pub struct Session<R> {
    state: AppState,
    services: Services,
    rng: R,
}

impl<R: Rng> Session<R> {
    pub fn new(services: Services, rng: R) -> Self {
        Self {
            state: AppState::default(),
            services,
            rng,
        }
    }

    /// Continue from a state rebuilt elsewhere, e.g. from a page link
    pub fn resume(services: Services, rng: R, state: AppState) -> Self {
        Self {
            state,
            services,
            rng,
        }
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply an event, settle card generation, and return the pending outward effects
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut pending = Vec::new();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            debug!("Applying {:?}", event);
            let (next, effects) = std::mem::take(&mut self.state).apply(event);
            self.state = next;

            for effect in effects {
                match effect {
                    Effect::GenerateCards(reading) => {
                        let cards = icebreaker::generate(Some(&reading), &mut self.rng);
                        queue.push_back(Event::CardsGenerated(cards));
                    }
                    other => pending.push(other),
                }
            }
        }

        pending
    }

    /// Apply an event and await every effect it causes, one after another
    pub async fn run(&mut self, event: Event) {
        let mut queue = VecDeque::from(self.handle(event));
        while let Some(effect) = queue.pop_front() {
            if let Some(next) = self.services.perform(effect).await {
                queue.extend(self.handle(next));
            }
        }
    }

    /// Start effects in the background; their outcomes arrive on `events`
    pub fn spawn_effects(&self, effects: Vec<Effect>, events: &UnboundedSender<Event>) {
        for effect in effects {
            let services = self.services.clone();
            let events = events.clone();
            tokio::spawn(async move {
                if let Some(event) = services.perform(effect).await {
                    // receiver gone means the session ended
                    let _ = events.send(event);
                }
            });
        }
    }
}
