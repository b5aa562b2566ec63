//! Coordinate → IANA timezone resolution
//!
//! Only consulted when the geocoder did not supply a timezone. Any failure
//! resolves to [`AUTO_TIMEZONE`].

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::cache::{ResponseCache, cache_key};
use crate::config::TimezoneConfig;
use crate::error::UpstreamError;
use crate::http::UpstreamClient;
use crate::models::{AUTO_TIMEZONE, Coordinate};

pub trait TimezoneLookup {
    /// IANA timezone id for `coordinate`, or `"auto"` when it cannot be determined.
    async fn resolve(&self, coordinate: Coordinate) -> String;
}

#[derive(Debug, Deserialize)]
struct TimezoneResponse {
    timezone: Option<String>,
}

/// Resolves timezones through the Open-Meteo forecast endpoint, which reports
/// the timezone it derived when asked for `timezone=auto`.
pub struct OpenMeteoTimezoneResolver {
    http: UpstreamClient,
    cache: Arc<ResponseCache>,
    url: String,
    timeout: Duration,
    ttl: Duration,
}

impl OpenMeteoTimezoneResolver {
    #[must_use]
    pub fn new(
        http: UpstreamClient,
        cache: Arc<ResponseCache>,
        config: &TimezoneConfig,
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

    async fn fetch_timezone(&self, params: &[(&str, String)]) -> Result<String, UpstreamError> {
        let response: TimezoneResponse = self.http.get_json(&self.url, params, self.timeout).await?;
        let timezone = response
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty())
            .ok_or_else(|| UpstreamError::parse("response has no timezone"))?;

        timezone
            .parse::<Tz>()
            .map_err(|_| UpstreamError::parse(format!("unknown timezone '{timezone}'")))?;
        Ok(timezone)
    }
}

impl TimezoneLookup for OpenMeteoTimezoneResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, coordinate: Coordinate) -> String {
        let params = [
            ("latitude", coordinate.latitude().to_string()),
            ("longitude", coordinate.longitude().to_string()),
            ("timezone", AUTO_TIMEZONE.to_string()),
            ("forecast_days", "1".to_string()),
        ];
        let key = cache_key("timezone", &params);

        match self
            .cache
            .get_or_fetch(&key, self.ttl, || self.fetch_timezone(&params))
            .await
        {
            Ok(timezone) => {
                debug!("Resolved timezone {}", timezone);
                timezone
            }
            Err(e) => {
                warn!("Timezone lookup failed, using '{}': {}", AUTO_TIMEZONE, e);
                AUTO_TIMEZONE.to_string()
            }
        }
    }
}
