//! Integration tests for the vaderprat CLI and HTTP clients

use std::process::Command;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use vaderprat::config::{LocationConfig, WeatherConfig};
use vaderprat::weather::open_meteo::HOURLY_VARS;
use vaderprat::{
    Coordinate, Geolocator, HourKeys, IpGeolocator, LocationResolver, LocationSource, OpenMeteoClient,
    WeatherError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn vaderprat() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vaderprat"));
    cmd.args(["--config", "/nonexistent/vaderprat.toml"]);
    cmd
}

/// Test that the CLI describes itself
#[test]
fn test_cli_help() {
    let output = vaderprat().arg("--help").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vaderprat"));
    assert!(stdout.contains("Weather receipt"));
    for command in ["show", "interactive", "serve", "share"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

/// Test that a share link is printed for a coordinate
#[test]
fn test_cli_share_link() {
    let output = vaderprat()
        .args(["share", "--lat", "59.3", "--lon", "18.1"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "http://localhost:8080/?lat=59.3&lon=18.1");
}

/// Test that an out-of-range coordinate is rejected
#[test]
fn test_cli_share_rejects_bad_coordinate() {
    let output = vaderprat()
        .args(["share", "--lat", "123", "--lon", "18.1"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

fn weather_config(server: &MockServer) -> WeatherConfig {
    WeatherConfig {
        forecast_url: format!("{}/v1/forecast", server.uri()),
        archive_url: format!("{}/v1/archive", server.uri()),
        timezone: "Europe/Stockholm".to_string(),
        timeout_seconds: 5,
    }
}

/// 12:30 in Stockholm, the day after a leap day
fn keys() -> HourKeys {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).unwrap();
    HourKeys::at(now, chrono_tz::Europe::Stockholm).unwrap()
}

fn forecast_body() -> serde_json::Value {
    json!({
        "latitude": 59.33,
        "longitude": 18.07,
        "hourly": {
            "time": ["2024-03-01T11:00", "2024-03-01T12:00", "2024-03-01T13:00"],
            "temperature_2m": [5.0, 6.5, 7.0],
            "precipitation_probability": [10, 55, 60],
            "windspeed_10m": [3.0, 8.2, 9.0]
        }
    })
}

fn archive_body() -> serde_json::Value {
    json!({
        "hourly": {
            "time": ["2024-02-29T11:00", "2024-02-29T12:00"],
            "temperature_2m": [1.0, 2.5],
            "precipitation_probability": [null, null],
            "windspeed_10m": [4.0, 4.5]
        }
    })
}

async fn mount(server: &MockServer, route: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_open_meteo_reading_for_same_hour_yesterday() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("hourly", HOURLY_VARS))
        .and(query_param("timezone", "Europe/Stockholm"))
        .and(query_param("wind_speed_unit", "ms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("start_date", "2024-02-29"))
        .and(query_param("end_date", "2024-02-29"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoClient::new(&weather_config(&server)).unwrap();
    let reading = client
        .fetch_reading_at(Coordinate::STOCKHOLM, &keys())
        .await
        .unwrap();

    assert_eq!(reading.temp_now, 6.5);
    assert_eq!(reading.temp_yesterday, 2.5);
    assert_eq!(reading.temp_delta, 4.0);
    assert_eq!(reading.wind_now, 8.2);
    assert_eq!(reading.rain_prob_now, 55.0);
    assert_eq!(reading.summary(), "Now 6.5 degC, rain 55%, wind 8.2 m/s.");
}

#[tokio::test]
async fn test_open_meteo_error_status() {
    let server = MockServer::start().await;
    mount(&server, "/v1/forecast", 200, forecast_body()).await;
    mount(&server, "/v1/archive", 500, json!({"error": true, "reason": "boom"})).await;

    let client = OpenMeteoClient::new(&weather_config(&server)).unwrap();
    let err = client
        .fetch_reading_at(Coordinate::STOCKHOLM, &keys())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WeatherError::Status {
            dataset: "archive",
            status: 500
        }
    );
}

#[tokio::test]
async fn test_open_meteo_missing_hour() {
    let server = MockServer::start().await;
    let mut forecast = forecast_body();
    forecast["hourly"]["time"] = json!(["2024-03-01T00:00", "2024-03-01T01:00", "2024-03-01T02:00"]);
    mount(&server, "/v1/forecast", 200, forecast).await;
    mount(&server, "/v1/archive", 200, archive_body()).await;

    let client = OpenMeteoClient::new(&weather_config(&server)).unwrap();
    let err = client
        .fetch_reading_at(Coordinate::STOCKHOLM, &keys())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WeatherError::TimestampMismatch {
            dataset: "forecast",
            key: "2024-03-01T12:00".to_string()
        }
    );
}

#[tokio::test]
async fn test_open_meteo_missing_hourly_block() {
    let server = MockServer::start().await;
    mount(&server, "/v1/forecast", 200, forecast_body()).await;
    mount(&server, "/v1/archive", 200, json!({"latitude": 59.33})).await;

    let client = OpenMeteoClient::new(&weather_config(&server)).unwrap();
    let err = client
        .fetch_reading_at(Coordinate::STOCKHOLM, &keys())
        .await
        .unwrap_err();

    assert_eq!(err, WeatherError::DataMissing { dataset: "archive" });
}

fn location_config(server: &MockServer) -> LocationConfig {
    LocationConfig {
        geolocation_url: format!("{}/json", server.uri()),
        geolocation_timeout_seconds: 2,
        ..LocationConfig::default()
    }
}

#[tokio::test]
async fn test_ip_geolocation_position() {
    let server = MockServer::start().await;
    mount(&server, "/json", 200, json!({"ip": "192.0.2.1", "loc": "57.7089,11.9746"})).await;

    let config = location_config(&server);
    let geolocator = IpGeolocator::new(&config).unwrap();
    let resolved = LocationResolver::new(&config)
        .unwrap()
        .locate_device(&geolocator)
        .await;

    assert_eq!(resolved.source, LocationSource::Gps);
    assert_eq!(resolved.coordinate, Coordinate::new(57.7089, 11.9746).unwrap());
    assert_eq!(resolved.error, None);
}

#[tokio::test]
async fn test_ip_geolocation_denied_falls_back() {
    let server = MockServer::start().await;
    mount(&server, "/json", 403, json!({"error": "rate limited"})).await;

    let config = location_config(&server);
    let geolocator = IpGeolocator::new(&config).unwrap();
    assert!(geolocator.current_position().await.is_err());

    let resolved = LocationResolver::new(&config)
        .unwrap()
        .locate_device(&geolocator)
        .await;

    assert_eq!(resolved.source, LocationSource::Fallback);
    assert_eq!(resolved.coordinate, Coordinate::STOCKHOLM);
    assert!(resolved.error.unwrap().contains("403"));
}

#[tokio::test]
async fn test_ip_geolocation_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"loc": "57.7,11.9"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = location_config(&server);
    let geolocator = IpGeolocator::new(&config).unwrap();
    let resolved = LocationResolver::with_timeout(Coordinate::STOCKHOLM, Duration::from_millis(200))
        .locate_device(&geolocator)
        .await;

    assert_eq!(resolved.source, LocationSource::Fallback);
    assert_eq!(
        resolved.error.as_deref(),
        Some("Location request timed out after 200ms.")
    );
}
