//! Per-session state: the current location and the selected unit system

use std::sync::Arc;

use crate::models::{Location, UnitSystem};

/// The single mutable selection a user interacts with.
///
/// The location is only ever replaced wholesale; readers holding the previous
/// `Arc` keep seeing a complete value.
#[derive(Debug, Clone)]
pub struct Session {
    location: Arc<Location>,
    units: UnitSystem,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Location::default(), UnitSystem::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(location: Location, units: UnitSystem) -> Self {
        Self {
            location: Arc::new(location),
            units,
        }
    }

    #[must_use]
    pub fn location(&self) -> Arc<Location> {
        Arc::clone(&self.location)
    }

    #[must_use]
    pub const fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn set_units(&mut self, units: UnitSystem) {
        self.units = units;
    }

    /// Swap in a new location, returning the new shared handle
    pub(crate) fn replace_location(&mut self, location: Location) -> Arc<Location> {
        self.location = Arc::new(location);
        self.location()
    }
}
