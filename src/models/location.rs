//! Location model for geographic coordinates and place metadata

use serde::{Deserialize, Serialize};

use crate::MapWeatherError;

/// Timezone sentinel understood by the forecast upstream as "derive it yourself".
pub const AUTO_TIMEZONE: &str = "auto";

/// Name given to a place the geocoder knows but cannot name.
pub const UNNAMED_PLACE: &str = "Selected point";

/// A point on the globe, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = MapWeatherError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting NaN and out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(MapWeatherError::validation(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(MapWeatherError::validation(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Format as `"lat, lon"` with two decimals
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.2}, {:.2}", self.latitude, self.longitude)
    }
}

/// A resolved place the weather is shown for.
///
/// `name` and `timezone` are never empty: `timezone` holds either an IANA id
/// or [`AUTO_TIMEZONE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Place name (city, region, or a synthesized label)
    pub name: String,
    /// Region / state
    pub admin1: Option<String>,
    /// Country name
    pub country: Option<String>,
    /// Point the weather is fetched for
    pub coordinate: Coordinate,
    /// IANA timezone id or `"auto"`
    pub timezone: String,
}

impl Location {
    /// Label used when no place name can be resolved for a coordinate
    #[must_use]
    pub fn fallback_name(coordinate: Coordinate) -> String {
        format!("{UNNAMED_PLACE} ({})", coordinate.format_coordinates())
    }

    /// Location shown before the user picks anything
    #[must_use]
    pub fn seoul() -> Self {
        Self {
            name: "Seoul".to_string(),
            admin1: Some("Seoul".to_string()),
            country: Some("South Korea".to_string()),
            coordinate: Coordinate {
                latitude: 37.57,
                longitude: 126.98,
            },
            timezone: "Asia/Seoul".to_string(),
        }
    }

    /// `name · admin1 · country`, skipping absent parts
    #[must_use]
    pub fn display_name(&self) -> String {
        [
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" · ")
    }

    /// Short label for the map marker
    #[must_use]
    pub fn marker_tooltip(&self) -> String {
        format!("{}, {}", self.name, self.country.as_deref().unwrap_or_default())
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::seoul()
    }
}

/// Treat empty or whitespace-only upstream strings as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
