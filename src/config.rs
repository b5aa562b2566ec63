//! Configuration management for `MapWeather`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MapWeatherError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `MapWeather`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MapWeatherConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Geocoding API configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Timezone lookup configuration
    #[serde(default)]
    pub timezone: TimezoneConfig,
    /// Forecast API configuration
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL; `/search` and `/reverse` are appended
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Language for place names
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u64,
    /// Candidates requested per name search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

/// Timezone lookup configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneConfig {
    /// Endpoint URL
    #[serde(default = "default_forecast_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timezone_timeout")]
    pub timeout_seconds: u64,
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Endpoint URL
    #[serde(default = "default_forecast_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_forecast_timeout")]
    pub timeout_seconds: u64,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_geocoding_ttl")]
    pub geocoding_ttl_seconds: u64,
    #[serde(default = "default_timezone_ttl")]
    pub timezone_ttl_seconds: u64,
    #[serde(default = "default_forecast_ttl")]
    pub forecast_ttl_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_geocoding_timeout() -> u64 {
    20
}

fn default_timezone_timeout() -> u64 {
    10
}

fn default_forecast_timeout() -> u64 {
    20
}

fn default_search_limit() -> usize {
    5
}

fn default_geocoding_ttl() -> u64 {
    3600
}

fn default_timezone_ttl() -> u64 {
    86_400
}

fn default_forecast_ttl() -> u64 {
    900
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            language: default_language(),
            timeout_seconds: default_geocoding_timeout(),
            search_limit: default_search_limit(),
        }
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            base_url: default_forecast_url(),
            timeout_seconds: default_timezone_timeout(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_forecast_url(),
            timeout_seconds: default_forecast_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            geocoding_ttl_seconds: default_geocoding_ttl(),
            timezone_ttl_seconds: default_timezone_ttl(),
            forecast_ttl_seconds: default_forecast_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl TimezoneConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ForecastConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

const MAX_TIMEOUT_SECONDS: u64 = 120;
const MAX_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;
const MAX_SEARCH_LIMIT: usize = 100;

impl MapWeatherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // MAPWEATHER_FORECAST__TIMEOUT_SECONDS=5 -> forecast.timeout_seconds
        builder = builder.add_source(
            Environment::with_prefix("MAPWEATHER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MapWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mapweather").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.language.is_empty() {
            self.geocoding.language = default_language();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.geocoding.search_limit == 0 {
            self.geocoding.search_limit = default_search_limit();
        }
        if self.timezone.base_url.is_empty() {
            self.timezone.base_url = default_forecast_url();
        }
        if self.timezone.timeout_seconds == 0 {
            self.timezone.timeout_seconds = default_timezone_timeout();
        }
        if self.forecast.base_url.is_empty() {
            self.forecast.base_url = default_forecast_url();
        }
        if self.forecast.timeout_seconds == 0 {
            self.forecast.timeout_seconds = default_forecast_timeout();
        }
        if self.cache.geocoding_ttl_seconds == 0 {
            self.cache.geocoding_ttl_seconds = default_geocoding_ttl();
        }
        if self.cache.timezone_ttl_seconds == 0 {
            self.cache.timezone_ttl_seconds = default_timezone_ttl();
        }
        if self.cache.forecast_ttl_seconds == 0 {
            self.cache.forecast_ttl_seconds = default_forecast_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Timezone", self.timezone.timeout_seconds),
            ("Forecast", self.forecast.timeout_seconds),
        ] {
            if timeout == 0 || timeout > MAX_TIMEOUT_SECONDS {
                return Err(MapWeatherError::config(format!(
                    "{name} timeout must be between 1 and {MAX_TIMEOUT_SECONDS} seconds"
                ))
                .into());
            }
        }

        for (name, ttl) in [
            ("Geocoding", self.cache.geocoding_ttl_seconds),
            ("Timezone", self.cache.timezone_ttl_seconds),
            ("Forecast", self.cache.forecast_ttl_seconds),
        ] {
            if ttl == 0 || ttl > MAX_TTL_SECONDS {
                return Err(MapWeatherError::config(format!(
                    "{name} cache TTL must be between 1 and {MAX_TTL_SECONDS} seconds (1 week)"
                ))
                .into());
            }
        }

        if self.geocoding.search_limit == 0 || self.geocoding.search_limit > MAX_SEARCH_LIMIT {
            return Err(MapWeatherError::config(format!(
                "Search limit must be between 1 and {MAX_SEARCH_LIMIT}"
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MapWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MapWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", &self.geocoding.base_url),
            ("Timezone", &self.timezone.base_url),
            ("Forecast", &self.forecast.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MapWeatherError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
