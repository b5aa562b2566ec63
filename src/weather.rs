use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::cache::{ResponseCache, cache_key};
use crate::config::ForecastConfig;
use crate::error::UpstreamError;
use crate::http::UpstreamClient;
use crate::models::forecast::FORECAST_DAYS;
use crate::models::{AUTO_TIMEZONE, Coordinate, ForecastBundle, UnitSystem};

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation,wind_speed_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max";

pub trait ForecastSource {
    /// Current, hourly and 7-day weather for a point. Fails when the upstream
    /// cannot be reached, rejects the request or returns an unreadable body.
    async fn get_forecast(
        &self,
        coordinate: Coordinate,
        timezone: &str,
        units: UnitSystem,
    ) -> Result<ForecastBundle, UpstreamError>;
}

pub struct OpenMeteoForecastClient {
    http: UpstreamClient,
    cache: Arc<ResponseCache>,
    url: String,
    timeout: Duration,
    ttl: Duration,
}

/// Query parameters for one forecast request.
fn forecast_params(
    coordinate: Coordinate,
    timezone: &str,
    units: UnitSystem,
) -> Vec<(&'static str, String)> {
    let timezone = match timezone.trim() {
        "" => AUTO_TIMEZONE,
        tz => tz,
    };
    vec![
        ("latitude", coordinate.latitude().to_string()),
        ("longitude", coordinate.longitude().to_string()),
        ("timezone", timezone.to_string()),
        ("current", CURRENT_FIELDS.to_string()),
        ("hourly", HOURLY_FIELDS.to_string()),
        ("daily", DAILY_FIELDS.to_string()),
        ("forecast_days", FORECAST_DAYS.to_string()),
        ("temperature_unit", units.temperature_unit().to_string()),
        ("wind_speed_unit", units.wind_speed_unit().to_string()),
        ("precipitation_unit", units.precipitation_unit().to_string()),
    ]
}

impl OpenMeteoForecastClient {
    #[must_use]
    pub fn new(
        http: UpstreamClient,
        cache: Arc<ResponseCache>,
        config: &ForecastConfig,
        ttl: Duration,
    ) -> Self {
        Self {
            http,
            cache,
            url: config.base_url.clone(),
            timeout: config.timeout(),
            ttl,
        }
    }

    async fn fetch_forecast(
        &self,
        params: &[(&str, String)],
        units: UnitSystem,
    ) -> Result<ForecastBundle, UpstreamError> {
        let response: openmeteo::ForecastResponse =
            self.http.get_json(&self.url, params, self.timeout).await?;
        let bundle = response.into_bundle(units);

        info!(
            "Retrieved forecast with {} hourly and {} daily entries",
            bundle.hourly.len(),
            bundle.daily.len()
        );
        Ok(bundle)
    }
}

impl ForecastSource for OpenMeteoForecastClient {
    #[instrument(skip(self))]
    async fn get_forecast(
        &self,
        coordinate: Coordinate,
        timezone: &str,
        units: UnitSystem,
    ) -> Result<ForecastBundle, UpstreamError> {
        let params = forecast_params(coordinate, timezone, units);
        let key = cache_key("forecast", &params);

        self.cache
            .get_or_fetch(&key, self.ttl, || self.fetch_forecast(&params, units))
            .await
    }
}

/// `OpenMeteo` forecast response structures and conversion
mod openmeteo {
    use super::{ForecastBundle, UnitSystem};
    use crate::models::{CurrentConditions, DailyEntry, HourlyEntry};
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::Deserialize;

    /// Parallel arrays indexed by time step; individual values may be null.
    type Series<T> = Option<Vec<Option<T>>>;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub timezone: Option<String>,
        pub current: Option<CurrentData>,
        pub hourly: Option<HourlyData>,
        pub daily: Option<DailyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<f64>,
        pub apparent_temperature: Option<f64>,
        #[serde(rename = "relative_humidity_2m")]
        pub relative_humidity: Option<f64>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Series<f64>,
        pub precipitation: Series<f64>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Series<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m_max")]
        pub temperature_max: Series<f64>,
        #[serde(rename = "temperature_2m_min")]
        pub temperature_min: Series<f64>,
        pub precipitation_sum: Series<f64>,
        #[serde(rename = "wind_speed_10m_max")]
        pub wind_speed_max: Series<f64>,
    }

    fn at(series: &Series<f64>, i: usize) -> Option<f64> {
        series.as_ref().and_then(|values| values.get(i).copied().flatten())
    }

    fn series_len(series: &Series<f64>) -> usize {
        series.as_ref().map_or(0, Vec::len)
    }

    impl ForecastResponse {
        pub fn into_bundle(self, units: UnitSystem) -> ForecastBundle {
            let current = self
                .current
                .map(|c| CurrentConditions {
                    temperature: c.temperature,
                    apparent_temperature: c.apparent_temperature,
                    relative_humidity: c.relative_humidity,
                    wind_speed: c.wind_speed,
                })
                .unwrap_or_default();

            let hourly = self.hourly.map(HourlyData::into_entries).unwrap_or_default();
            let daily = self.daily.map(DailyData::into_entries).unwrap_or_default();

            ForecastBundle {
                units,
                timezone: self.timezone,
                current,
                hourly,
                daily,
            }
        }
    }

    impl HourlyData {
        fn into_entries(self) -> Vec<HourlyEntry> {
            let len = [
                self.time.len(),
                series_len(&self.temperature),
                series_len(&self.precipitation),
                series_len(&self.wind_speed),
            ]
            .into_iter()
            .max()
            .unwrap_or(0);

            (0..len)
                .map(|i| HourlyEntry {
                    time: self
                        .time
                        .get(i)
                        .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok()),
                    temperature: at(&self.temperature, i),
                    precipitation: at(&self.precipitation, i),
                    wind_speed: at(&self.wind_speed, i),
                })
                .collect()
        }
    }

    impl DailyData {
        fn into_entries(self) -> Vec<DailyEntry> {
            let len = [
                self.time.len(),
                series_len(&self.temperature_max),
                series_len(&self.temperature_min),
                series_len(&self.precipitation_sum),
                series_len(&self.wind_speed_max),
            ]
            .into_iter()
            .max()
            .unwrap_or(0);

            (0..len)
                .map(|i| DailyEntry {
                    date: self
                        .time
                        .get(i)
                        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
                    temp_max: at(&self.temperature_max, i),
                    temp_min: at(&self.temperature_min, i),
                    precipitation_sum: at(&self.precipitation_sum, i),
                    wind_speed_max: at(&self.wind_speed_max, i),
                })
                .collect()
        }
    }
}
