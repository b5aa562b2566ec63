//! Unit system selection and its upstream/display mappings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MapWeatherError;

/// Display convention for temperature and wind speed.
///
/// Precipitation is always millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// `temperature_unit` query value
    #[must_use]
    pub const fn temperature_unit(&self) -> &'static str {
        match self {
            Self::Metric => "celsius",
            Self::Imperial => "fahrenheit",
        }
    }

    /// `wind_speed_unit` query value
    #[must_use]
    pub const fn wind_speed_unit(&self) -> &'static str {
        match self {
            Self::Metric => "kmh",
            Self::Imperial => "mph",
        }
    }

    /// `precipitation_unit` query value, identical for both systems
    #[must_use]
    pub const fn precipitation_unit(&self) -> &'static str {
        "mm"
    }

    #[must_use]
    pub const fn temperature_label(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    #[must_use]
    pub const fn wind_speed_label(&self) -> &'static str {
        match self {
            Self::Metric => "km/h",
            Self::Imperial => "mph",
        }
    }

    #[must_use]
    pub const fn precipitation_label(&self) -> &'static str {
        "mm"
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = MapWeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(MapWeatherError::validation(format!(
                "Unknown unit system '{other}'. Must be one of: metric, imperial"
            ))),
        }
    }
}
