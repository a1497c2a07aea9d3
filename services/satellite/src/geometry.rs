//! Coordinates and query results.

use std::fmt;

/// A single grid cell coordinate.
///
/// Signed so that negative requests survive until validation rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// Column
    pub x: i32,
    /// Row, counted from the bottom of the map
    pub y: i32,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {}, y: {})", self.x, self.y)
    }
}

/// Axis-aligned region given by its lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    /// Lower-left corner
    pub ll: Location,
    /// Upper-right corner
    pub ur: Location,
}

impl Area {
    /// Creates an area from its two corners.
    #[must_use]
    pub const fn new(ll: Location, ur: Location) -> Self {
        Self { ll, ur }
    }
}

/// One pixel of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    /// Where the pixel was read
    pub location: Location,
    /// The pixel value
    pub value: u8,
}

impl Pixel {
    /// Creates a pixel result.
    #[must_use]
    pub const fn new(location: Location, value: u8) -> Self {
        Self { location, value }
    }
}
