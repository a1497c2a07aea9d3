//! Progressive terminal rendering of streamed pixels.

use std::io::{self, Write};

use tracing::debug;

use crate::geometry::Pixel;
use crate::grid::GridDimensions;

const BLANK: u8 = b' ';

/// A blank map that fills in as pixels arrive.
///
/// Every time another `width` pixels have been placed, the next row from
/// the top is written out. Rows are printed in arrival order of whole
/// widths, not by checking which cells are filled.
#[derive(Debug, Clone)]
pub struct MapCanvas {
    dimensions: GridDimensions,
    cells: Vec<u8>,
    placed: usize,
    rows_rendered: usize,
}

impl MapCanvas {
    /// Creates a blank canvas.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            cells: vec![BLANK; dimensions.area()],
            placed: 0,
            rows_rendered: 0,
        }
    }

    /// Places a pixel and writes every row that became due.
    ///
    /// Pixels outside the canvas are dropped. Returns the number of rows
    /// written.
    pub fn place<W: Write>(&mut self, pixel: Pixel, out: &mut W) -> io::Result<usize> {
        let Some(index) = self.index(pixel) else {
            debug!(location = %pixel.location, "Pixel outside canvas dropped");
            return Ok(0);
        };

        self.cells[index] = pixel.value;
        self.placed += 1;

        let due = (self.placed / self.dimensions.width).min(self.dimensions.height);
        let mut written = 0;
        while self.rows_rendered < due {
            self.write_next_row(out)?;
            written += 1;
        }
        Ok(written)
    }

    /// Writes the rows not yet rendered, top to bottom.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> io::Result<usize> {
        let mut written = 0;
        while self.rows_rendered < self.dimensions.height {
            self.write_next_row(out)?;
            written += 1;
        }
        out.flush()?;
        Ok(written)
    }

    /// Number of pixels placed so far.
    #[must_use]
    pub const fn placed(&self) -> usize {
        self.placed
    }

    /// Number of rows written so far.
    #[must_use]
    pub const fn rows_rendered(&self) -> usize {
        self.rows_rendered
    }

    fn index(&self, pixel: Pixel) -> Option<usize> {
        let x = usize::try_from(pixel.location.x).ok()?;
        let y = usize::try_from(pixel.location.y).ok()?;
        (x < self.dimensions.width && y < self.dimensions.height)
            .then(|| y * self.dimensions.width + x)
    }

    fn write_next_row<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let y = self.dimensions.height - 1 - self.rows_rendered;
        let start = y * self.dimensions.width;
        let line: String = self.cells[start..start + self.dimensions.width]
            .iter()
            .map(|&b| char::from(b))
            .collect();
        writeln!(out, "{line}")?;
        self.rows_rendered += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Location;

    fn px(x: i32, y: i32, value: u8) -> Pixel {
        Pixel::new(Location::new(x, y), value)
    }

    #[test]
    fn test_row_is_written_after_width_pixels() {
        let mut canvas = MapCanvas::new(GridDimensions::new(3, 2));
        let mut out = Vec::new();

        assert_eq!(canvas.place(px(0, 1, b'a'), &mut out).unwrap(), 0);
        assert_eq!(canvas.place(px(1, 1, b'b'), &mut out).unwrap(), 0);
        assert_eq!(canvas.place(px(2, 1, b'c'), &mut out).unwrap(), 1);

        assert_eq!(String::from_utf8(out).unwrap(), "abc\n");
        assert_eq!(canvas.rows_rendered(), 1);
    }

    #[test]
    fn test_unfilled_cells_render_blank() {
        let mut canvas = MapCanvas::new(GridDimensions::new(2, 2));
        let mut out = Vec::new();

        canvas.place(px(0, 1, b'#'), &mut out).unwrap();
        canvas.finish(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "# \n  \n");
    }

    #[test]
    fn test_out_of_bounds_pixel_is_dropped() {
        let mut canvas = MapCanvas::new(GridDimensions::new(2, 2));
        let mut out = Vec::new();

        assert_eq!(canvas.place(px(2, 0, b'#'), &mut out).unwrap(), 0);
        assert_eq!(canvas.place(px(-1, 0, b'#'), &mut out).unwrap(), 0);
        assert_eq!(canvas.placed(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_finish_after_full_render_writes_nothing() {
        let mut canvas = MapCanvas::new(GridDimensions::new(1, 2));
        let mut out = Vec::new();

        canvas.place(px(0, 1, b'x'), &mut out).unwrap();
        canvas.place(px(0, 0, b'y'), &mut out).unwrap();
        assert_eq!(canvas.finish(&mut out).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "x\ny\n");
    }

    #[test]
    fn test_full_map_area_renders_every_row_after_finish() {
        // A whole-map area skips the bottom row and the right column
        let dims = GridDimensions::new(4, 3);
        let mut canvas = MapCanvas::new(dims);
        let mut out = Vec::new();

        for y in (1..3).rev() {
            for x in 0..3 {
                canvas.place(px(x, y, b'#'), &mut out).unwrap();
            }
        }
        assert_eq!(canvas.rows_rendered(), 1);

        assert_eq!(canvas.finish(&mut out).unwrap(), 2);
        assert_eq!(canvas.rows_rendered(), 3);
        assert_eq!(String::from_utf8(out).unwrap(), "### \n### \n    \n");
    }
}
