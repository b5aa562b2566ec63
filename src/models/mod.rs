//! Data models for `MapWeather`
//!
//! - Location: coordinates and resolved place metadata
//! - Units: metric/imperial selection
//! - Forecast: current, hourly and daily weather

pub mod forecast;
pub mod location;
pub mod units;

pub use forecast::{CurrentConditions, DailyEntry, ForecastBundle, HourlyEntry};
pub use location::{AUTO_TIMEZONE, Coordinate, Location, UNNAMED_PLACE};
pub use units::UnitSystem;
