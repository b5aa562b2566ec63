//! Location Resolution Module
//!
//! Turns a map click or a search query into a fully populated [`Location`]
//! and installs it in the [`Session`]. A click always produces a location,
//! falling back to a synthesized label and the `"auto"` timezone; a search
//! with no match leaves the session untouched.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::geocoding::PlaceLookup;
use crate::models::{Coordinate, Location};
use crate::session::Session;
use crate::timezone::TimezoneLookup;

/// A user action that selects a location
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Map click at a point
    Click(Coordinate),
    /// Free-text place search, first of up to `limit` candidates wins
    Search { query: String, limit: usize },
}

/// Outcome of applying a [`LocationInput`] to a session
#[derive(Debug, Clone)]
pub enum LocationUpdate {
    /// The session now points at this location
    Replaced(Arc<Location>),
    /// Nothing matched; the session keeps its previous location
    Unchanged(Arc<Location>),
}

impl LocationUpdate {
    /// Location the session holds after the update
    #[must_use]
    pub fn location(&self) -> &Arc<Location> {
        match self {
            Self::Replaced(location) | Self::Unchanged(location) => location,
        }
    }

    #[must_use]
    pub const fn is_replaced(&self) -> bool {
        matches!(self, Self::Replaced(_))
    }
}

/// Service for resolving location inputs
pub struct LocationResolver<G, T> {
    geocoder: G,
    timezones: T,
}

impl<G: PlaceLookup, T: TimezoneLookup> LocationResolver<G, T> {
    pub const fn new(geocoder: G, timezones: T) -> Self {
        Self {
            geocoder,
            timezones,
        }
    }

    pub const fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Resolve a clicked coordinate. Never fails: a nameless place gets a
    /// generic label, no place at all gets a coordinate label, and missing timezones by the resolver's
    /// answer (itself `"auto"` on failure).
    #[instrument(skip(self))]
    pub async fn resolve_click(&self, coordinate: Coordinate) -> Location {
        let location = match self.geocoder.reverse_lookup(coordinate).await {
            Some(place) => {
                let name = place.label();
                let timezone = match place.timezone {
                    Some(timezone) => timezone,
                    None => {
                        debug!("Reverse lookup has no timezone, resolving separately");
                        self.timezones.resolve(coordinate).await
                    }
                };
                Location {
                    name,
                    admin1: place.admin1,
                    country: place.country,
                    coordinate,
                    timezone,
                }
            }
            None => {
                debug!("No place at {}, using coordinate label", coordinate.format_coordinates());
                Location {
                    name: Location::fallback_name(coordinate),
                    admin1: None,
                    country: None,
                    coordinate,
                    timezone: self.timezones.resolve(coordinate).await,
                }
            }
        };

        info!("Resolved click to '{}' ({})", location.name, location.timezone);
        location
    }

    /// First search candidate, taken verbatim, or `None` when nothing matched
    #[instrument(skip(self))]
    pub async fn resolve_search(&self, query: &str, limit: usize) -> Option<Location> {
        let location = self
            .geocoder
            .forward_search(query, limit)
            .await
            .into_iter()
            .next();

        match &location {
            Some(found) => info!("Search '{}' matched '{}'", query, found.name),
            None => info!("Search '{}' matched nothing", query),
        }
        location
    }

    /// Resolve a click and install the result in `session`
    pub async fn handle_click(&self, session: &mut Session, coordinate: Coordinate) -> Arc<Location> {
        let location = self.resolve_click(coordinate).await;
        session.replace_location(location)
    }

    /// Run a search and install the first match in `session`. Returns whether
    /// the session location changed.
    pub async fn handle_search(&self, session: &mut Session, query: &str, limit: usize) -> bool {
        match self.resolve_search(query, limit).await {
            Some(location) => {
                session.replace_location(location);
                true
            }
            None => false,
        }
    }

    /// Apply any [`LocationInput`] to `session`
    pub async fn apply(&self, session: &mut Session, input: LocationInput) -> LocationUpdate {
        match input {
            LocationInput::Click(coordinate) => {
                LocationUpdate::Replaced(self.handle_click(session, coordinate).await)
            }
            LocationInput::Search { query, limit } => {
                if self.handle_search(session, &query, limit).await {
                    LocationUpdate::Replaced(session.location())
                } else {
                    LocationUpdate::Unchanged(session.location())
                }
            }
        }
    }
}
