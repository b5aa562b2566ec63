//! Forward and reverse geocoding against the Open-Meteo geocoding API
//!
//! Both lookups go through the shared [`ResponseCache`]. Upstream failures are
//! collapsed here into "no result": callers always get a value they can fall
//! back from.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::{ResponseCache, cache_key};
use crate::config::GeocodingConfig;
use crate::error::UpstreamError;
use crate::http::UpstreamClient;
use crate::models::location::non_blank;
use crate::models::{AUTO_TIMEZONE, Coordinate, Location, UNNAMED_PLACE};

/// Upper bound the upstream accepts for `count`
const MAX_SEARCH_LIMIT: usize = 100;

/// A reverse-geocoding hit. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Place {
    pub name: Option<String>,
    pub admin1: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

impl Place {
    /// Best available label: name, then region, then [`UNNAMED_PLACE`].
    #[must_use]
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.admin1.clone())
            .unwrap_or_else(|| UNNAMED_PLACE.to_string())
    }
}

/// Place lookups used by the location pipeline.
pub trait PlaceLookup {
    /// Candidates for a free-text query, best match first. Empty on no match or failure.
    async fn forward_search(&self, query: &str, limit: usize) -> Vec<Location>;

    /// Nearest place to `coordinate`, or `None` on no match or failure.
    async fn reverse_lookup(&self, coordinate: Coordinate) -> Option<Place>;
}

pub struct OpenMeteoGeocoder {
    http: UpstreamClient,
    cache: Arc<ResponseCache>,
    base_url: String,
    language: String,
    timeout: Duration,
    ttl: Duration,
}

impl OpenMeteoGeocoder {
    #[must_use]
    pub fn new(
        http: UpstreamClient,
        cache: Arc<ResponseCache>,
        config: &GeocodingConfig,
        ttl: Duration,
    ) -> Self {
        Self {
            http,
            cache,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            timeout: config.timeout(),
            ttl,
        }
    }

    async fn fetch_search(
        &self,
        params: &[(&str, String)],
    ) -> Result<Vec<Location>, UpstreamError> {
        let url = format!("{}/search", self.base_url);
        let response: openmeteo::GeocodingResponse =
            self.http.get_json(&url, params, self.timeout).await?;

        Ok(response
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|result| match result.into_location() {
                Ok(location) => Some(location),
                Err(e) => {
                    warn!("Skipping geocoding candidate: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn fetch_reverse(
        &self,
        params: &[(&str, String)],
    ) -> Result<Option<Place>, UpstreamError> {
        let url = format!("{}/reverse", self.base_url);
        let response: openmeteo::GeocodingResponse =
            self.http.get_json(&url, params, self.timeout).await?;

        Ok(response
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(openmeteo::GeocodingResult::into_place))
    }
}

impl PlaceLookup for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn forward_search(&self, query: &str, limit: usize) -> Vec<Location> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            debug!("Empty search, skipping upstream");
            return Vec::new();
        }

        let params = [
            ("name", query.to_string()),
            ("count", limit.min(MAX_SEARCH_LIMIT).to_string()),
            ("language", self.language.clone()),
            ("format", "json".to_string()),
        ];
        let key = cache_key("geocode/search", &params);

        match self
            .cache
            .get_or_fetch(&key, self.ttl, || self.fetch_search(&params))
            .await
        {
            Ok(locations) => {
                if locations.is_empty() {
                    info!("No results found for '{}'", query);
                } else {
                    info!("Found {} geocoding results for '{}'", locations.len(), query);
                }
                locations
            }
            Err(e) => {
                warn!("Forward geocoding failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    async fn reverse_lookup(&self, coordinate: Coordinate) -> Option<Place> {
        let params = [
            ("latitude", coordinate.latitude().to_string()),
            ("longitude", coordinate.longitude().to_string()),
            ("language", self.language.clone()),
        ];
        let key = cache_key("geocode/reverse", &params);

        match self
            .cache
            .get_or_fetch(&key, self.ttl, || self.fetch_reverse(&params))
            .await
        {
            Ok(place) => {
                debug!("Reverse geocoded to {:?}", place);
                place
            }
            Err(e) => {
                warn!("Reverse geocoding failed, falling back: {}", e);
                None
            }
        }
    }
}

/// Open-Meteo geocoding wire format
mod openmeteo {
    use super::{AUTO_TIMEZONE, Coordinate, Location, Place, non_blank};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingResult>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub name: Option<String>,
        pub latitude: f64,
        pub longitude: f64,
        pub country: Option<String>,
        pub admin1: Option<String>,
        pub timezone: Option<String>,
    }

    impl GeocodingResult {
        pub fn into_place(self) -> Place {
            Place {
                name: non_blank(self.name),
                admin1: non_blank(self.admin1),
                country: non_blank(self.country),
                timezone: non_blank(self.timezone),
            }
        }

        pub fn into_location(self) -> crate::Result<Location> {
            let coordinate = Coordinate::new(self.latitude, self.longitude)?;
            let place = self.into_place();
            Ok(Location {
                name: place.label(),
                admin1: place.admin1,
                country: place.country,
                coordinate,
                timezone: place.timezone.unwrap_or_else(|| AUTO_TIMEZONE.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn geocoder(server: &MockServer) -> OpenMeteoGeocoder {
        let config = GeocodingConfig {
            base_url: server.uri(),
            ..GeocodingConfig::default()
        };
        OpenMeteoGeocoder::new(
            UpstreamClient::new().unwrap(),
            Arc::new(ResponseCache::new()),
            &config,
            Duration::from_secs(3600),
        )
    }

    fn coordinate(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn test_forward_search_maps_results_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Paris"))
            .and(query_param("count", "2"))
            .and(query_param("language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"name": "Paris", "admin1": "Île-de-France", "country": "France",
                     "latitude": 48.85, "longitude": 2.35, "timezone": "Europe/Paris"},
                    {"name": "Paris", "admin1": "Texas", "country": "United States",
                     "latitude": 33.66, "longitude": -95.55}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = geocoder(&server).await.forward_search(" Paris ", 2).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].country.as_deref(), Some("France"));
        assert_eq!(results[0].timezone, "Europe/Paris");
        assert_eq!(results[1].admin1.as_deref(), Some("Texas"));
        assert_eq!(results[1].timezone, AUTO_TIMEZONE);
    }

    #[tokio::test]
    async fn test_forward_search_empty_query_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(0)
            .mount(&server)
            .await;

        let geocoder = geocoder(&server).await;
        assert!(geocoder.forward_search("", 5).await.is_empty());
        assert!(geocoder.forward_search("   ", 5).await.is_empty());
        assert!(geocoder.forward_search("Paris", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_forward_search_without_results_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generationtime_ms": 0.5})))
            .mount(&server)
            .await;

        assert!(geocoder(&server).await.forward_search("Xyzzy", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_forward_search_drops_out_of_range_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"name": "Broken", "latitude": 123.0, "longitude": 0.0},
                    {"name": "Fine", "latitude": 1.0, "longitude": 2.0}
                ]
            })))
            .mount(&server)
            .await;

        let results = geocoder(&server).await.forward_search("x", 5).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Fine");
    }

    #[tokio::test]
    async fn test_forward_search_failure_is_empty_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let geocoder = geocoder(&server).await;
        assert!(geocoder.forward_search("Paris", 5).await.is_empty());
        assert!(geocoder.forward_search("Paris", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_reverse_lookup_returns_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("latitude", "37.57"))
            .and(query_param("longitude", "126.98"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"name": "Seoul", "country": "South Korea", "admin1": "",
                     "latitude": 37.566, "longitude": 126.9784, "timezone": "Asia/Seoul"},
                    {"name": "Elsewhere", "latitude": 0.0, "longitude": 0.0}
                ]
            })))
            .mount(&server)
            .await;

        let place = geocoder(&server)
            .await
            .reverse_lookup(coordinate(37.57, 126.98))
            .await
            .unwrap();
        assert_eq!(
            place,
            Place {
                name: Some("Seoul".to_string()),
                admin1: None,
                country: Some("South Korea".to_string()),
                timezone: Some("Asia/Seoul".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_forward_search_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Oslo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"name": "Oslo", "country": "Norway",
                             "latitude": 59.91, "longitude": 10.75, "timezone": "Europe/Oslo"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder = geocoder(&server).await;
        let first = geocoder.forward_search("Oslo", 5).await;
        let second = geocoder.forward_search("Oslo", 5).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(second[0].coordinate, coordinate(59.91, 10.75));
    }

    #[tokio::test]
    async fn test_forward_search_nameless_candidate_gets_generic_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"name": "", "country": "Norway", "latitude": 61.0, "longitude": 8.5}]
            })))
            .mount(&server)
            .await;

        let results = geocoder(&server).await.forward_search("fjord", 5).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, UNNAMED_PLACE);
        assert_eq!(results[0].country.as_deref(), Some("Norway"));
        assert_eq!(results[0].timezone, AUTO_TIMEZONE);
    }

    #[tokio::test]
    async fn test_reverse_lookup_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder = geocoder(&server).await;
        assert_eq!(geocoder.reverse_lookup(coordinate(0.0, -140.0)).await, None);
        assert_eq!(geocoder.reverse_lookup(coordinate(0.0, -140.0)).await, None);
    }

    #[tokio::test]
    async fn test_reverse_lookup_failures_collapse_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert_eq!(
            geocoder(&server).await.reverse_lookup(coordinate(10.0, 10.0)).await,
            None
        );
    }

    #[test]
    fn test_place_label_fallback_chain() {
        let mut place = Place {
            name: Some("Town".to_string()),
            admin1: Some("Region".to_string()),
            ..Place::default()
        };
        assert_eq!(place.label(), "Town");
        place.name = None;
        assert_eq!(place.label(), "Region");
        place.admin1 = None;
        assert_eq!(place.label(), "Selected point");
    }
}
