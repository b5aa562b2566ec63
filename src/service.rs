//! Weather Service Module
//!
//! Facade the UI talks to: location selection, forecast retrieval for the
//! current session, and cache maintenance.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::cache::{CachePolicy, ResponseCache};
use crate::config::MapWeatherConfig;
use crate::error::{MapWeatherError, UpstreamError};
use crate::geocoding::{OpenMeteoGeocoder, PlaceLookup};
use crate::http::UpstreamClient;
use crate::location_resolver::LocationResolver;
use crate::models::{Coordinate, ForecastBundle, Location, UnitSystem};
use crate::report::WeatherReport;
use crate::session::Session;
use crate::timezone::{OpenMeteoTimezoneResolver, TimezoneLookup};
use crate::weather::{ForecastSource, OpenMeteoForecastClient};

/// The service wired to the Open-Meteo upstreams
pub type OpenMeteoService =
    WeatherService<OpenMeteoGeocoder, OpenMeteoTimezoneResolver, OpenMeteoForecastClient>;

/// Forecast for the current location, or why there is none
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ForecastOutcome {
    Ok { report: WeatherReport },
    Error { message: String },
}

/// Everything the UI renders for one session
#[derive(Debug, Clone, Serialize)]
pub struct WeatherView {
    pub location: Location,
    pub units: UnitSystem,
    pub forecast: ForecastOutcome,
}

impl WeatherView {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.forecast, ForecastOutcome::Error { .. })
    }
}

pub struct WeatherService<G, T, F> {
    resolver: LocationResolver<G, T>,
    forecasts: F,
    cache: Arc<ResponseCache>,
    search_limit: usize,
}

impl OpenMeteoService {
    /// Build the upstream clients from configuration around one shared cache
    pub fn from_config(config: &MapWeatherConfig) -> crate::Result<Self> {
        let http = UpstreamClient::new()?;
        let cache = Arc::new(ResponseCache::new());
        let policy = CachePolicy::from(&config.cache);

        let geocoder = OpenMeteoGeocoder::new(
            http.clone(),
            Arc::clone(&cache),
            &config.geocoding,
            policy.geocoding,
        );
        let timezones = OpenMeteoTimezoneResolver::new(
            http.clone(),
            Arc::clone(&cache),
            &config.timezone,
            policy.timezone,
        );
        let forecasts =
            OpenMeteoForecastClient::new(http, Arc::clone(&cache), &config.forecast, policy.forecast);

        Ok(Self::new(
            LocationResolver::new(geocoder, timezones),
            forecasts,
            cache,
            config.geocoding.search_limit,
        ))
    }
}

impl<G, T, F> WeatherService<G, T, F>
where
    G: PlaceLookup,
    T: TimezoneLookup,
    F: ForecastSource,
{
    pub const fn new(
        resolver: LocationResolver<G, T>,
        forecasts: F,
        cache: Arc<ResponseCache>,
        search_limit: usize,
    ) -> Self {
        Self {
            resolver,
            forecasts,
            cache,
            search_limit,
        }
    }

    /// Select the clicked point as the session location
    pub async fn click(&self, session: &mut Session, coordinate: Coordinate) -> Arc<Location> {
        self.resolver.handle_click(session, coordinate).await
    }

    /// Select the best match for `query`; `limit` defaults to the configured
    /// search limit. Returns whether the location changed.
    pub async fn search(&self, session: &mut Session, query: &str, limit: Option<usize>) -> bool {
        let limit = limit.unwrap_or(self.search_limit);
        self.resolver.handle_search(session, query, limit).await
    }

    pub fn set_units(&self, session: &mut Session, units: UnitSystem) {
        info!("Switching units to {}", units);
        session.set_units(units);
    }

    /// Forecast for the session's location and units
    #[instrument(skip(self, session))]
    pub async fn forecast(&self, session: &Session) -> Result<ForecastBundle, UpstreamError> {
        let location = session.location();
        self.forecasts
            .get_forecast(location.coordinate, &location.timezone, session.units())
            .await
    }

    /// Current location with either a report or the failure message. A failed
    /// forecast never falls back to older data.
    pub async fn view(&self, session: &Session) -> WeatherView {
        let location = session.location();
        let forecast = match self.forecast(session).await {
            Ok(bundle) => ForecastOutcome::Ok {
                report: WeatherReport::build(&location, &bundle),
            },
            Err(e) => {
                warn!("Forecast for '{}' failed: {}", location.name, e);
                ForecastOutcome::Error {
                    message: MapWeatherError::from(e).user_message(),
                }
            }
        };

        WeatherView {
            location: Location::clone(&location),
            units: session.units(),
            forecast,
        }
    }

    /// Drop every cached upstream response
    pub fn clear_cache(&self) {
        info!("Clearing response cache ({} entries)", self.cache.len());
        self.cache.clear_all();
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }
}
