//! Map text loading.
//!
//! A map file is a sequence of lines, one per row. The file is written top
//! row first, so the first line read fills the last grid row.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::{Grid, GridDimensions};

/// Map loading errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum GridError {
    /// Map file could not be opened or read
    #[error("Can't read map {path}: {source}")]
    Io {
        /// Map path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Width or height is zero
    #[error("Map dimensions must be greater than 0")]
    EmptyDimensions,

    /// The source has fewer lines than the map height
    #[error("Map has {found} rows, expected {expected}")]
    MissingRows {
        /// Configured height
        expected: usize,
        /// Rows actually provided
        found: usize,
    },

    /// A line is narrower than the map width
    #[error("Map row {row} has {found} pixels, expected {expected}")]
    ShortRow {
        /// Grid row index (0 is the bottom)
        row: usize,
        /// Configured width
        expected: usize,
        /// Pixels actually provided
        found: usize,
    },
}

/// What to do when the map source is smaller than the configured grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    /// Missing rows or short lines fail the load
    #[default]
    Strict,
    /// Missing rows and short lines are padded with the given pixel
    Pad(u8),
}

/// Builds a [`Grid`] from map text.
#[derive(Debug, Clone, Copy)]
pub struct GridLoader {
    dimensions: GridDimensions,
    fill: FillPolicy,
}

impl GridLoader {
    /// Creates a loader for the given dimensions.
    #[must_use]
    pub const fn new(dimensions: GridDimensions, fill: FillPolicy) -> Self {
        Self { dimensions, fill }
    }

    /// Loads the map file at `path`.
    pub fn load_file(&self, path: &Path) -> Result<Grid, GridError> {
        let file = File::open(path).map_err(|source| GridError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let grid = self
            .load_reader(BufReader::new(file))
            .map_err(|err| match err {
                GridError::Io { source, .. } => GridError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })?;

        info!(
            path = %path.display(),
            width = grid.width(),
            height = grid.height(),
            "Map loaded"
        );
        Ok(grid)
    }

    /// Loads a map from any line-oriented reader.
    pub fn load_reader<R: BufRead>(&self, reader: R) -> Result<Grid, GridError> {
        let GridDimensions { width, height } = self.dimensions;
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimensions);
        }

        // Rows indexed bottom-up; `None` until a line fills them.
        let mut rows: Vec<Option<Vec<u8>>> = vec![None; height];

        for (read, line) in reader.lines().take(height).enumerate() {
            let line = line.map_err(|source| GridError::Io {
                path: PathBuf::new(),
                source,
            })?;
            let row = height - 1 - read;
            rows[row] = Some(self.fit_row(row, line.into_bytes())?);
        }

        let found = rows.iter().filter(|r| r.is_some()).count();
        let rows = match self.fill {
            FillPolicy::Strict if found < height => {
                return Err(GridError::MissingRows {
                    expected: height,
                    found,
                });
            }
            FillPolicy::Pad(pixel) => {
                if found < height {
                    warn!(
                        expected = height,
                        found,
                        fill = %char::from(pixel),
                        "Map shorter than grid height, padding missing rows"
                    );
                }
                rows.into_iter()
                    .map(|r| r.unwrap_or_else(|| vec![pixel; width]))
                    .collect()
            }
            FillPolicy::Strict => rows.into_iter().flatten().collect(),
        };

        Grid::from_rows(self.dimensions, rows)
    }

    fn fit_row(&self, row: usize, mut data: Vec<u8>) -> Result<Vec<u8>, GridError> {
        let width = self.dimensions.width;
        if data.len() >= width {
            data.truncate(width);
            return Ok(data);
        }

        match self.fill {
            FillPolicy::Strict => Err(GridError::ShortRow {
                row,
                expected: width,
                found: data.len(),
            }),
            FillPolicy::Pad(pixel) => {
                data.resize(width, pixel);
                Ok(data)
            }
        }
    }
}
