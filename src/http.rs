//! HTTP plumbing shared by the upstream clients
//!
//! One GET per call, no retries. Every failure is classified into an
//! [`UpstreamError`] so callers decide whether to degrade or surface it.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::error::UpstreamError;

const USER_AGENT: &str = concat!("MapWeather/", env!("CARGO_PKG_VERSION"));
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Error body shape used by Open-Meteo on 4xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new() -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(UpstreamError::from)?;
        Ok(Self { client })
    }

    /// GET `url` with `query` and decode the JSON body, failing the call once
    /// `timeout` has elapsed.
    #[instrument(skip(self, query, timeout), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, UpstreamError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("Request failed after {:.3}s: {}", start.elapsed().as_secs_f64(), e);
                UpstreamError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::from)?;
        let elapsed = start.elapsed();
        debug!("HTTP response received: {} in {:.3}s", status, elapsed.as_secs_f64());

        if elapsed > SLOW_RESPONSE {
            warn!("Slow upstream response: {:.3}s", elapsed.as_secs_f64());
        }

        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.reason);
            warn!("Upstream returned {}", status);
            return Err(UpstreamError::status(status.as_u16(), reason));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse upstream response: {}", e);
            UpstreamError::from(e)
        })
    }
}
