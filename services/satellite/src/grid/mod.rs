//! In-memory satellite map.
//!
//! The grid is built once at startup and shared read-only (`Arc<Grid>`)
//! between all calls. Row 0 is the bottom row of the map.

pub mod loader;

pub use loader::{FillPolicy, GridError, GridLoader};

/// Width and height of the map in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
}

impl GridDimensions {
    /// Creates a dimension pair.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::new(80, 32)
    }
}

/// Immutable row-major raster of single-byte pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    dimensions: GridDimensions,
    pixels: Vec<u8>,
}

impl Grid {
    /// Builds a grid from rows given bottom row first.
    ///
    /// Every row must hold exactly `dimensions.width` pixels and there must be
    /// exactly `dimensions.height` rows. Use [`GridLoader`] to build a grid
    /// from map text.
    pub fn from_rows(dimensions: GridDimensions, rows: Vec<Vec<u8>>) -> Result<Self, GridError> {
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(GridError::EmptyDimensions);
        }
        if rows.len() != dimensions.height {
            return Err(GridError::MissingRows {
                expected: dimensions.height,
                found: rows.len(),
            });
        }

        let mut pixels = Vec::with_capacity(dimensions.area());
        for (row, data) in rows.into_iter().enumerate() {
            if data.len() != dimensions.width {
                return Err(GridError::ShortRow {
                    row,
                    expected: dimensions.width,
                    found: data.len(),
                });
            }
            pixels.extend_from_slice(&data);
        }

        Ok(Self { dimensions, pixels })
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.dimensions.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.dimensions.height
    }

    /// Reads the pixel at column `x`, row `y`.
    ///
    /// The caller validates the coordinates first; an out-of-range read is a
    /// programming error and panics on the slice index.
    #[must_use]
    pub fn pixel_at(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.dimensions.width + x]
    }

    /// One full row, bottom row is 0.
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.dimensions.width;
        &self.pixels[start..start + self.dimensions.width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_three() -> Grid {
        Grid::from_rows(
            GridDimensions::new(2, 3),
            vec![b"ab".to_vec(), b"cd".to_vec(), b"ef".to_vec()],
        )
        .unwrap()
    }

    #[test]
    fn test_pixel_at_reads_requested_column() {
        let grid = two_by_three();
        assert_eq!(grid.pixel_at(0, 0), b'a');
        assert_eq!(grid.pixel_at(1, 0), b'b');
        assert_eq!(grid.pixel_at(0, 2), b'e');
    }

    #[test]
    fn test_pixel_at_last_column() {
        let grid = two_by_three();
        let last = grid.width() - 1;
        assert_eq!(grid.pixel_at(last, 1), b'd');
    }

    #[test]
    fn test_row_slices() {
        let grid = two_by_three();
        assert_eq!(grid.row(1), b"cd");
    }

    #[test]
    fn test_from_rows_rejects_wrong_row_count() {
        let result = Grid::from_rows(GridDimensions::new(2, 3), vec![b"ab".to_vec()]);
        assert!(matches!(
            result,
            Err(GridError::MissingRows { expected: 3, found: 1 })
        ));
    }

    #[test]
    fn test_from_rows_rejects_zero_dimensions() {
        let result = Grid::from_rows(GridDimensions::new(0, 0), vec![]);
        assert!(matches!(result, Err(GridError::EmptyDimensions)));
    }
}
