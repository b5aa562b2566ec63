//! `MapWeather` - weather for any point on the map
//!
//! Turns a map click or a place search into a resolved location (reverse
//! geocoding with timezone fallback) and fetches current, hourly and 7-day
//! forecasts for it from Open-Meteo, memoizing upstream calls in a TTL cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod http;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod report;
pub mod service;
pub mod session;
pub mod timezone;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::{CachePolicy, ResponseCache};
pub use config::MapWeatherConfig;
pub use error::{MapWeatherError, UpstreamError};
pub use location_resolver::{LocationInput, LocationResolver, LocationUpdate};
pub use models::{Coordinate, ForecastBundle, Location, UnitSystem};
pub use report::WeatherReport;
pub use service::{OpenMeteoService, WeatherService, WeatherView};
pub use session::Session;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MapWeatherError>;
