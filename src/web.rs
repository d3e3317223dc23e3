use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use url::Url;

use crate::api::{self, AppContext};
use crate::clipboard::SelectionClipboard;
use crate::config::VaderpratConfig;
use crate::location_resolver::share_url;
use crate::models::{Coordinate, LocationSource, Receipt, WeatherReading};
use crate::render;
use crate::session::Services;
use crate::state::{AppState, Event};

pub fn app(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(page))
        .route("/locate", get(locate))
        .route("/regenerate", get(regenerate))
        .nest("/api", api::router())
        .with_state(ctx)
        .layer(cors)
}

pub async fn run(config: &VaderpratConfig) -> Result<()> {
    // the browser owns the clipboard; the page shows the link instead
    let services = Services::from_config(config, Arc::new(SelectionClipboard))?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app(AppContext { services }))
        .await
        .context("Web server stopped")?;
    Ok(())
}

async fn page(State(ctx): State<AppContext>, RawQuery(query): RawQuery) -> Html<String> {
    let state = ctx.load(query.as_deref(), false).await;
    Html(render_html(&state, &ctx.services.share_base))
}

async fn locate(State(ctx): State<AppContext>) -> Html<String> {
    let state = ctx.load(None, true).await;
    Html(render_html(&state, &ctx.services.share_base))
}

/// What the page showed: location, its source and error, and the reading
#[derive(Debug, Deserialize)]
struct PageSnapshot {
    lat: f64,
    lon: f64,
    source: LocationSource,
    error: Option<String>,
    temp_now: Option<f64>,
    temp_yesterday: Option<f64>,
    wind_now: Option<f64>,
    rain_prob_now: Option<f64>,
}

impl PageSnapshot {
    fn from_state(state: &AppState) -> Option<Self> {
        let coordinate = state.coordinate?;
        let reading = state.weather.as_ref();
        Some(Self {
            lat: coordinate.latitude,
            lon: coordinate.longitude,
            source: state.source,
            error: state.error.clone(),
            temp_now: reading.map(|r| r.temp_now),
            temp_yesterday: reading.map(|r| r.temp_yesterday),
            wind_now: reading.map(|r| r.wind_now),
            rain_prob_now: reading.map(|r| r.rain_prob_now),
        })
    }

    fn link(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("lat", &self.lat.to_string());
        query.append_pair("lon", &self.lon.to_string());
        query.append_pair("source", self.source.label());
        if let Some(error) = &self.error {
            query.append_pair("error", error);
        }
        let values = [
            ("temp_now", self.temp_now),
            ("temp_yesterday", self.temp_yesterday),
            ("wind_now", self.wind_now),
            ("rain_prob_now", self.rain_prob_now),
        ];
        for (name, value) in values {
            if let Some(value) = value {
                query.append_pair(name, &value.to_string());
            }
        }
        format!("/regenerate?{}", query.finish())
    }

    fn into_state(self) -> Option<AppState> {
        let coordinate = Coordinate::new(self.lat, self.lon).ok()?;
        let weather = match (self.temp_now, self.temp_yesterday, self.wind_now, self.rain_prob_now) {
            (Some(now), Some(yesterday), Some(wind), Some(rain)) => {
                Some(WeatherReading::new(now, yesterday, wind, rain)?)
            }
            (None, None, None, None) => None,
            _ => return None,
        };
        Some(AppState {
            coordinate: Some(coordinate),
            source: self.source,
            error: self.error,
            weather,
            ..AppState::default()
        })
    }
}

/// New cards for the reading already on the page; nothing is fetched again
async fn regenerate(
    State(ctx): State<AppContext>,
    Query(snapshot): Query<PageSnapshot>,
) -> Result<Html<String>, StatusCode> {
    let state = snapshot.into_state().ok_or(StatusCode::BAD_REQUEST)?;
    let mut session = ctx.resume(state);
    session.run(Event::Regenerate).await;
    Ok(Html(render_html(session.state(), &ctx.services.share_base)))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// The page: location line, buttons, receipt and the three cards
pub fn render_html(state: &AppState, share_base: &Url) -> String {
    let receipt = Receipt::from(state.weather.as_ref());
    let location_class = if state.error.is_some() { "debug error" } else { "debug" };

    let share = state
        .coordinate
        .map(|c| {
            let link = share_url(share_base, c).to_string();
            format!(
                "<p class=\"share\">Share: <a href=\"{0}\">{0}</a></p>",
                escape(&link)
            )
        })
        .unwrap_or_default();

    let regenerate = PageSnapshot::from_state(state)
        .map(|snapshot| snapshot.link())
        .unwrap_or_else(|| "/".to_string());

    let copied = state
        .copied_link
        .as_deref()
        .map(|link| format!("<p class=\"toast\">Link copied: {}</p>", escape(link)))
        .unwrap_or_default();

    let cards: String = state
        .cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            format!(
                "<article class=\"card\"><h3>Icebreaker {}</h3>\
                 <p><strong>Say:</strong> {}</p>\
                 <p><strong>Ask:</strong> {}</p>\
                 <p><strong>Twist:</strong> {}</p></article>",
                index + 1,
                escape(&card.say),
                escape(&card.ask),
                escape(&card.twist)
            )
        })
        .collect();

    format!(
        "<!doctype html>\n<html lang=\"sv\"><head><meta charset=\"utf-8\">\
         <title>Väderprat</title></head><body>\
         <p class=\"{location_class}\">{location}</p>\
         <nav><a href=\"/locate\">Use my location</a> \
         <a href=\"{regenerate}\">New icebreakers</a></nav>{copied}{share}\
         <table class=\"receipt\">\
         <tr><td>Now</td><td>{now}</td></tr>\
         <tr><td>Yesterday</td><td>{yesterday}</td></tr>\
         <tr><td>Delta</td><td>{delta}</td></tr>\
         <tr><td>Wind</td><td>{wind}</td></tr>\
         <tr><td>Rain</td><td>{rain}</td></tr>\
         </table><p class=\"summary\">{summary}</p>{cards}</body></html>",
        location = escape(&render::location_line(state)),
        regenerate = escape(&regenerate),
        now = escape(&receipt.temp_now),
        yesterday = escape(&receipt.temp_yesterday),
        delta = escape(&receipt.temp_delta),
        wind = escape(&receipt.wind_now),
        rain = escape(&receipt.rain_now),
        summary = escape(&receipt.summary),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LocationError, WeatherError};
    use crate::icebreaker;
    use crate::location_resolver::{Geolocator, LocationResolver};
    use crate::weather::WeatherService;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    struct StubWeather(Result<WeatherReading, WeatherError>);

    #[async_trait]
    impl WeatherService for StubWeather {
        async fn fetch_reading(&self, _coordinate: Coordinate) -> Result<WeatherReading, WeatherError> {
            self.0.clone()
        }
    }

    struct NoGeolocation;

    #[async_trait]
    impl Geolocator for NoGeolocation {
        async fn current_position(&self) -> Result<Coordinate, LocationError> {
            Err(LocationError::timeout_or_denied("denied"))
        }
    }

    fn test_app(weather: Result<WeatherReading, WeatherError>) -> Router {
        app(AppContext {
            services: Services {
                weather: Arc::new(StubWeather(weather)),
                geolocator: Arc::new(NoGeolocation),
                resolver: Arc::new(LocationResolver::with_timeout(
                    Coordinate::STOCKHOLM,
                    Duration::from_millis(100),
                )),
                clipboard: Arc::new(SelectionClipboard),
                share_base: Url::parse("https://prat.example/").unwrap(),
            },
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_page_from_url_coordinate() {
        let reading = WeatherReading::new(21.0, 17.0, 3.0, 10.0).unwrap();
        let (status, body) = get(test_app(Ok(reading)), "/?lat=59.3&lon=18.1").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Using: lat 59.3000, lon 18.1000 (URL)"));
        assert!(body.contains("21.0 degC"));
        assert!(body.contains("warmer than yesterday"));
        assert!(body.contains("https://prat.example/?lat=59.3&amp;lon=18.1"));
    }

    #[tokio::test]
    async fn test_page_without_coordinate_shows_defaults() {
        let (status, body) = get(test_app(Err(WeatherError::transport("offline"))), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("(not set)"));
        assert!(body.contains("-- degC"));
        assert!(body.contains(&icebreaker::default_cards()[0].say));
    }

    #[tokio::test]
    async fn test_locate_falls_back_and_reports_weather_error() {
        let err = WeatherError::TimestampMismatch {
            dataset: "forecast",
            key: "2024-01-01T00:00".to_string(),
        };
        let (_, body) = get(test_app(Err(err)), "/locate").await;

        assert!(body.contains("(fallback)"));
        assert!(body.contains("Could not match hour 2024-01-01T00:00 in forecast weather data."));
        assert!(body.contains("Weather unavailable right now."));
    }

    #[tokio::test]
    async fn test_api_share() {
        let app = test_app(Err(WeatherError::transport("unused")));
        let (status, body) = get(app.clone(), "/api/share?lat=59.3&lon=18.1").await;
        assert_eq!(status, StatusCode::OK);
        let share: api::ApiShare = serde_json::from_str(&body).unwrap();
        assert_eq!(share.url, "https://prat.example/?lat=59.3&lon=18.1");

        let (status, _) = get(app, "/api/share?lat=north&lon=18.1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_conditions() {
        let reading = WeatherReading::new(5.0, 9.0, 12.0, 70.0).unwrap();
        let (status, body) = get(test_app(Ok(reading)), "/api/conditions?lat=59.3&lon=18.1").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["state"]["source"], "URL");
        assert_eq!(json["receipt"]["temp_delta"], "-4.0 degC");
        assert_eq!(json["state"]["cards"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_api_icebreakers() {
        let app = test_app(Err(WeatherError::transport("unused")));
        let request = Request::builder()
            .method("POST")
            .uri("/api/icebreakers")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"temp_now": 10.0, "temp_yesterday": 13.5, "wind_now": 2.0, "rain_prob_now": 90.0}"#,
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let cards: Vec<crate::models::IcebreakerCard> = serde_json::from_slice(&body).unwrap();
        assert_eq!(cards.len(), 3);
        assert!(cards.iter().any(|c| c.say.contains("colder than yesterday")));
        assert!(cards.iter().any(|c| c.say.contains("umbrella anxiety")));
    }

    async fn post_icebreakers(app: Router, body: &'static str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/icebreakers")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_api_icebreakers_null_and_incomplete() {
        let app = test_app(Err(WeatherError::transport("unused")));

        let (status, body) = post_icebreakers(app.clone(), "null").await;
        assert_eq!(status, StatusCode::OK);
        let cards: Vec<crate::models::IcebreakerCard> = serde_json::from_str(&body).unwrap();
        assert_eq!(cards, icebreaker::default_cards().to_vec());

        let (status, _) = post_icebreakers(app, r#"{"temp_now": 10.0, "temp_delta": 5.0}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    fn fallback_state() -> AppState {
        AppState {
            coordinate: Some(Coordinate::STOCKHOLM),
            source: LocationSource::Fallback,
            error: Some("denied".to_string()),
            weather: WeatherReading::new(4.0, 9.0, 9.5, 60.0),
            ..AppState::default()
        }
    }

    fn regenerate_href(html: &str) -> String {
        let start = html.find("href=\"/regenerate?").unwrap() + "href=\"".len();
        let end = start + html[start..].find('"').unwrap();
        html[start..end].replace("&amp;", "&")
    }

    #[tokio::test]
    async fn test_regenerate_keeps_source_and_error() {
        let base = Url::parse("https://prat.example/").unwrap();
        let href = regenerate_href(&render_html(&fallback_state(), &base));
        assert!(href.contains("source=fallback"));

        // a weather call would replace the error with this message
        let app = test_app(Err(WeatherError::transport("refetched")));
        let (status, body) = get(app, &href).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Using: lat 59.3293, lon 18.0686 (fallback) | Error: denied"));
        assert!(!body.contains("refetched"));
        assert!(body.contains("-5.0 degC"));
        assert!(body.contains("colder than yesterday"));
        assert!(body.contains("umbrella anxiety"));
    }

    #[tokio::test]
    async fn test_regenerate_rejects_partial_reading() {
        let app = test_app(Err(WeatherError::transport("unused")));
        let (status, _) = get(app, "/regenerate?lat=59.3&lon=18.1&source=GPS&temp_now=4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_html_confirms_copied_link() {
        let base = Url::parse("https://prat.example/").unwrap();
        let state = AppState {
            copied_link: Some("https://prat.example/?lat=1&lon=2".to_string()),
            ..fallback_state()
        };
        assert!(render_html(&state, &base).contains("Link copied: https://prat.example/?lat=1&amp;lon=2"));
        assert!(!render_html(&fallback_state(), &base).contains("Link copied"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }
}
