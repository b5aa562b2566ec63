//! End-to-end tests for the MapWeather HTTP API against mocked upstreams

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mapweather::api::AppState;
use mapweather::config::MapWeatherConfig;
use mapweather::service::OpenMeteoService;
use mapweather::web;

fn test_config(server: &MockServer) -> MapWeatherConfig {
    let mut config = MapWeatherConfig::default();
    config.geocoding.base_url = format!("{}/geo", server.uri());
    config.timezone.base_url = format!("{}/timezone", server.uri());
    config.forecast.base_url = format!("{}/forecast", server.uri());
    config
}

fn test_app(server: &MockServer) -> Router {
    let service = OpenMeteoService::from_config(&test_config(server)).unwrap();
    web::app(AppState::new(service))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn forecast_body() -> Value {
    json!({
        "timezone": "Asia/Seoul",
        "current": {
            "temperature_2m": 20.5,
            "apparent_temperature": 19.0,
            "relative_humidity_2m": 55,
            "wind_speed_10m": 6.1
        },
        "hourly": {
            "time": ["2025-06-01T00:00", "2025-06-01T01:00"],
            "temperature_2m": [18.0, 17.5],
            "precipitation": [0.0, 0.2],
            "wind_speed_10m": [4.0, 5.0]
        },
        "daily": {
            "time": ["2025-06-01"],
            "temperature_2m_max": [24.0],
            "temperature_2m_min": [15.0],
            "precipitation_sum": [0.2],
            "wind_speed_10m_max": [9.0]
        }
    })
}

#[tokio::test]
async fn test_initial_state_is_seoul_metric() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let (status, body) = send(&app, "GET", "/api/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"]["name"], "Seoul");
    assert_eq!(body["location"]["timezone"], "Asia/Seoul");
    assert_eq!(body["units"], "metric");
}

#[tokio::test]
async fn test_click_in_open_ocean_synthesizes_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/timezone"))
        .and(query_param("latitude", "0"))
        .and(query_param("longitude", "-140"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"timezone": "Etc/GMT+9"})))
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(
        &app,
        "POST",
        "/api/click",
        Some(json!({"latitude": 0.0, "longitude": -140.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Selected point (0.00, -140.00)");
    assert_eq!(body["admin1"], Value::Null);
    assert_eq!(body["country"], Value::Null);
    assert_eq!(body["timezone"], "Etc/GMT+9");

    let (_, state) = send(&app, "GET", "/api/state", None).await;
    assert_eq!(state["location"], body);
}

#[tokio::test]
async fn test_click_with_geocoder_timezone_skips_timezone_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "name": "Seoul", "latitude": 37.566, "longitude": 126.978,
                "country": "South Korea", "timezone": "Asia/Seoul"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/timezone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"timezone": "Etc/UTC"})))
        .expect(0)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(
        &app,
        "POST",
        "/api/click",
        Some(json!({"latitude": 37.57, "longitude": 126.98})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Seoul");
    assert_eq!(body["country"], "South Korea");
    assert_eq!(body["timezone"], "Asia/Seoul");
}

#[tokio::test]
async fn test_click_survives_all_upstreams_failing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(
        &app,
        "POST",
        "/api/click",
        Some(json!({"latitude": 51.5, "longitude": -0.12})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Selected point (51.50, -0.12)");
    assert_eq!(body["timezone"], "auto");
}

#[tokio::test]
async fn test_click_rejects_invalid_coordinate() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let (status, body) = send(
        &app,
        "POST",
        "/api/click",
        Some(json!({"latitude": 95.0, "longitude": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Latitude"));

    let (_, state) = send(&app, "GET", "/api/state", None).await;
    assert_eq!(state["location"]["name"], "Seoul");
}

#[tokio::test]
async fn test_search_match_and_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/search"))
        .and(query_param("name", "Paris"))
        .and(query_param("count", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "name": "Paris", "latitude": 48.85, "longitude": 2.35,
                "country": "France", "admin1": "Île-de-France", "timezone": "Europe/Paris"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geo/search"))
        .and(query_param("name", "Atlantis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generationtime_ms": 0.5})))
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(&app, "POST", "/api/search", Some(json!({"query": "Paris"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(body["location"]["name"], "Paris");
    assert_eq!(body["location"]["timezone"], "Europe/Paris");

    let (_, body) = send(
        &app,
        "POST",
        "/api/search",
        Some(json!({"query": "Atlantis", "limit": 3})),
    )
    .await;
    assert_eq!(body["matched"], false);
    assert_eq!(body["location"]["name"], "Paris");
}

#[tokio::test]
async fn test_empty_search_makes_no_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(&app, "POST", "/api/search", Some(json!({"query": "  "}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], false);
    assert_eq!(body["location"]["name"], "Seoul");
}

#[tokio::test]
async fn test_weather_per_unit_system_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("timezone", "Asia/Seoul"))
        .and(query_param("temperature_unit", "celsius"))
        .and(query_param("wind_speed_unit", "kmh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("temperature_unit", "fahrenheit"))
        .and(query_param("wind_speed_unit", "mph"))
        .and(query_param("precipitation_unit", "mm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let (status, body) = send(&app, "GET", "/api/weather", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forecast"]["status"], "ok");
    let report = &body["forecast"]["report"];
    assert_eq!(report["place"], "Seoul · Seoul · South Korea");
    assert_eq!(report["cards"][0]["value"], "20.5°C");
    assert_eq!(report["cards"][3]["value"], "55.0%");
    assert_eq!(report["daily"][0]["max"], "24.0°C");
    assert_eq!(report["attribution"], "Data: © Open-Meteo.com");

    let (status, state) = send(&app, "PUT", "/api/units", Some(json!({"units": "imperial"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["units"], "imperial");

    let (_, body) = send(&app, "GET", "/api/weather", None).await;
    assert_eq!(body["forecast"]["report"]["temperature_label"], "°F");
    assert_eq!(body["forecast"]["report"]["cards"][2]["value"], "6.1 mph");

    send(&app, "PUT", "/api/units", Some(json!({"units": "metric"}))).await;
    let (_, body) = send(&app, "GET", "/api/weather", None).await;
    assert_eq!(body["forecast"]["report"]["temperature_label"], "°C");
}

#[tokio::test]
async fn test_weather_failure_is_reported_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    let app = test_app(&server);

    for _ in 0..2 {
        let (status, body) = send(&app, "GET", "/api/weather", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["forecast"]["status"], "error");
        assert!(body["forecast"]["message"].as_str().unwrap().contains("500"));
        assert!(body["forecast"].get("report").is_none());
        assert_eq!(body["location"]["name"], "Seoul");
    }
}

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(2)
        .mount(&server)
        .await;
    let app = test_app(&server);

    send(&app, "GET", "/api/weather", None).await;
    send(&app, "GET", "/api/weather", None).await;

    let (status, _) = send(&app, "POST", "/api/cache/clear", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/weather", None).await;
    assert_eq!(status, StatusCode::OK);
}
