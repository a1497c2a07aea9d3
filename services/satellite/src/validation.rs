//! Coordinate and area validation.
//!
//! Bounds checks and shape checks are kept apart so each failure gets its own
//! error: a corner outside the map is `OutOfRange`, inverted corners are
//! `InvalidArea`.

use tracing::warn;

use crate::error::SatelliteError;
use crate::geometry::Location;
use crate::grid::GridDimensions;

/// Validates coordinates against fixed grid dimensions.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateValidator {
    dimensions: GridDimensions,
}

impl CoordinateValidator {
    /// Creates a validator for the given grid dimensions.
    #[must_use]
    pub const fn new(dimensions: GridDimensions) -> Self {
        Self { dimensions }
    }

    /// True iff `loc` lies in `[0, width) x [0, height)`.
    #[must_use]
    pub fn validate_location(&self, loc: &Location) -> bool {
        in_range(loc.x, self.dimensions.width) && in_range(loc.y, self.dimensions.height)
    }

    /// True iff the corners are not inverted. Does not check bounds.
    #[must_use]
    pub const fn validate_area(&self, ll: &Location, ur: &Location) -> bool {
        ll.x <= ur.x && ll.y <= ur.y
    }

    /// Like [`Self::validate_location`], failing with `OutOfRange`.
    pub fn check_location(&self, loc: &Location) -> Result<(), SatelliteError> {
        if self.validate_location(loc) {
            return Ok(());
        }

        let err = SatelliteError::OutOfRange { x: loc.x, y: loc.y };
        warn!(x = loc.x, y = loc.y, error = %err, "Location rejected");
        Err(err)
    }

    /// Like [`Self::validate_area`], failing with `InvalidArea`.
    pub fn check_area(&self, ll: &Location, ur: &Location) -> Result<(), SatelliteError> {
        if self.validate_area(ll, ur) {
            return Ok(());
        }

        let err = SatelliteError::InvalidArea { ll: *ll, ur: *ur };
        warn!(ll = %ll, ur = %ur, error = %err, "Area rejected");
        Err(err)
    }
}

fn in_range(value: i32, limit: usize) -> bool {
    usize::try_from(value).is_ok_and(|v| v < limit)
}
