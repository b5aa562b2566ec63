//! Forecast bundle returned by the forecast client

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::UnitSystem;

/// Days of daily data requested from upstream
pub const FORECAST_DAYS: usize = 7;

/// Hourly entries shown to the user
pub const HOURLY_WINDOW: usize = 24;

/// Shown in place of a value the upstream omitted
pub const PLACEHOLDER: &str = "–";

/// Conditions at the time of the request. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    /// Relative humidity in percent
    pub relative_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// One hour of forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Local time at the location
    pub time: Option<NaiveDateTime>,
    pub temperature: Option<f64>,
    /// Precipitation in mm
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// One day of forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: Option<NaiveDate>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    /// Precipitation sum in mm
    pub precipitation_sum: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

/// Current, hourly and daily weather for one location in one unit system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    /// Unit system the values are expressed in
    pub units: UnitSystem,
    /// Timezone the upstream used for the time axis
    pub timezone: Option<String>,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
}

impl ForecastBundle {
    /// First [`HOURLY_WINDOW`] hourly entries
    #[must_use]
    pub fn next_hours(&self) -> &[HourlyEntry] {
        &self.hourly[..self.hourly.len().min(HOURLY_WINDOW)]
    }

    /// First [`FORECAST_DAYS`] daily entries
    #[must_use]
    pub fn week(&self) -> &[DailyEntry] {
        &self.daily[..self.daily.len().min(FORECAST_DAYS)]
    }
}

/// Format an optional value with one decimal and a unit suffix, or the placeholder.
#[must_use]
pub fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => PLACEHOLDER.to_string(),
    }
}
