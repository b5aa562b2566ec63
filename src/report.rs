//! Display-ready weather for one location

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::forecast::format_value;
use crate::models::{ForecastBundle, HourlyEntry, Location, UnitSystem};

pub const ATTRIBUTION: &str = "Data: © Open-Meteo.com";

/// A labelled headline value, already formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

/// Next 24 hours as chart series. A series the upstream did not send at all
/// is left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySeries {
    pub time: Vec<Option<NaiveDateTime>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<Vec<Option<f64>>>,
}

/// One line of the 7-day table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRow {
    pub date: Option<NaiveDate>,
    pub max: String,
    pub min: String,
    pub precipitation: String,
    pub wind_max: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub place: String,
    pub tooltip: String,
    pub coordinates: String,
    pub timezone: String,
    pub units: UnitSystem,
    pub temperature_label: &'static str,
    pub wind_speed_label: &'static str,
    pub precipitation_label: &'static str,
    pub cards: Vec<MetricCard>,
    pub hourly: HourlySeries,
    pub daily: Vec<DailyRow>,
    pub attribution: &'static str,
}

fn series(hours: &[HourlyEntry], field: fn(&HourlyEntry) -> Option<f64>) -> Option<Vec<Option<f64>>> {
    let values: Vec<Option<f64>> = hours.iter().map(field).collect();
    values.iter().any(Option::is_some).then_some(values)
}

impl WeatherReport {
    #[must_use]
    pub fn build(location: &Location, bundle: &ForecastBundle) -> Self {
        let units = bundle.units;
        let temperature = units.temperature_label();
        let wind = format!(" {}", units.wind_speed_label());
        let precipitation = format!(" {}", units.precipitation_label());
        let current = &bundle.current;

        let cards = vec![
            MetricCard {
                label: "Temperature",
                value: format_value(current.temperature, temperature),
            },
            MetricCard {
                label: "Feels like",
                value: format_value(current.apparent_temperature, temperature),
            },
            MetricCard {
                label: "Wind",
                value: format_value(current.wind_speed, &wind),
            },
            MetricCard {
                label: "Humidity",
                value: format_value(current.relative_humidity, "%"),
            },
        ];

        let hours = bundle.next_hours();
        let hourly = HourlySeries {
            time: hours.iter().map(|h| h.time).collect(),
            temperature: series(hours, |h| h.temperature),
            precipitation: series(hours, |h| h.precipitation),
            wind_speed: series(hours, |h| h.wind_speed),
        };

        let daily = bundle
            .week()
            .iter()
            .map(|day| DailyRow {
                date: day.date,
                max: format_value(day.temp_max, temperature),
                min: format_value(day.temp_min, temperature),
                precipitation: format_value(day.precipitation_sum, &precipitation),
                wind_max: format_value(day.wind_speed_max, &wind),
            })
            .collect();

        Self {
            place: location.display_name(),
            tooltip: location.marker_tooltip(),
            coordinates: location.coordinate.format_coordinates(),
            timezone: bundle
                .timezone
                .clone()
                .unwrap_or_else(|| location.timezone.clone()),
            units,
            temperature_label: temperature,
            wind_speed_label: units.wind_speed_label(),
            precipitation_label: units.precipitation_label(),
            cards,
            hourly,
            daily,
            attribution: ATTRIBUTION,
        }
    }
}
