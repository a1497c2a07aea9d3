//! Point and area queries over the grid.
//!
//! [`QueryService`] holds no transport types. Point queries return a single
//! [`Pixel`]; area queries validate up front and hand back a lazy
//! [`AreaStream`], which a [`Pacer`] then drives into any [`PixelSink`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::auth::{AuthContext, AuthorizationGate};
use crate::error::SatelliteError;
use crate::geometry::{Area, Location, Pixel};
use crate::grid::Grid;
use crate::shutdown::ShutdownSignal;
use crate::validation::CoordinateValidator;

/// Orchestrates validation, authorization and grid reads.
#[derive(Debug, Clone)]
pub struct QueryService {
    grid: Arc<Grid>,
    validator: CoordinateValidator,
    gate: AuthorizationGate,
}

impl QueryService {
    /// Creates a query service over a loaded grid.
    #[must_use]
    pub fn new(grid: Arc<Grid>, gate: AuthorizationGate) -> Self {
        let validator = CoordinateValidator::new(grid.dimensions());
        Self {
            grid,
            validator,
            gate,
        }
    }

    /// Reads one pixel after authorizing the caller.
    ///
    /// Authorization runs first, so an unauthorized caller learns nothing
    /// about the coordinates it sent.
    pub fn get_point(
        &self,
        loc: Location,
        ctx: Option<&AuthContext>,
    ) -> Result<Pixel, SatelliteError> {
        self.gate.authorize(ctx)?;
        self.validator.check_location(&loc)?;

        let (x, y) = grid_index(loc);
        Ok(Pixel::new(loc, self.grid.pixel_at(x, y)))
    }

    /// Validates an area and returns its pixels as a lazy sequence.
    ///
    /// Area queries are not authorized. Corners are bounds-checked lower-left
    /// first, then the shape is checked.
    pub fn stream_area(&self, area: Area) -> Result<AreaStream, SatelliteError> {
        self.validator.check_location(&area.ll)?;
        self.validator.check_location(&area.ur)?;
        self.validator.check_area(&area.ll, &area.ur)?;

        Ok(AreaStream::new(Arc::clone(&self.grid), area))
    }
}

/// Converts a validated location into grid indices.
#[allow(clippy::cast_sign_loss)]
const fn grid_index(loc: Location) -> (usize, usize) {
    (loc.x as usize, loc.y as usize)
}

/// Pixels of a validated area, in emission order.
///
/// Rows are visited from `ur.y` down to `ll.y + 1`; within a row, columns
/// run from `ll.x` up to `ur.x - 1`. An area with zero width or height
/// yields nothing.
#[derive(Debug, Clone)]
pub struct AreaStream {
    grid: Arc<Grid>,
    origin: Location,
    columns: i32,
    /// Offset of the current row above `origin.y`; 0 means exhausted
    row: i32,
    column: i32,
}

impl AreaStream {
    fn new(grid: Arc<Grid>, area: Area) -> Self {
        let columns = area.ur.x - area.ll.x;
        let rows = area.ur.y - area.ll.y;
        Self {
            grid,
            origin: area.ll,
            columns,
            row: if columns == 0 { 0 } else { rows },
            column: 0,
        }
    }

    /// Pixels left to yield.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn remaining(&self) -> usize {
        if self.row <= 0 {
            return 0;
        }
        (self.row * self.columns - self.column) as usize
    }
}

impl Iterator for AreaStream {
    type Item = Pixel;

    fn next(&mut self) -> Option<Pixel> {
        if self.row <= 0 {
            return None;
        }

        let loc = Location::new(self.origin.x + self.column, self.origin.y + self.row);
        let (x, y) = grid_index(loc);
        let pixel = Pixel::new(loc, self.grid.pixel_at(x, y));

        self.column += 1;
        if self.column == self.columns {
            self.column = 0;
            self.row -= 1;
        }

        Some(pixel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AreaStream {}

/// Destination for streamed pixels.
#[async_trait]
pub trait PixelSink: Send {
    /// Delivers one pixel, waiting on the consumer if it is slow.
    ///
    /// Fails with `StreamClosed` once the consumer is gone.
    async fn send(&mut self, pixel: Pixel) -> Result<(), SatelliteError>;

    /// Resolves when the consumer has gone away.
    async fn closed(&self);
}

/// Drives area streams into sinks with a fixed inter-item delay.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    shutdown: ShutdownSignal,
}

impl Pacer {
    /// Creates a pacer sleeping `delay` after each pixel.
    #[must_use]
    pub const fn new(delay: Duration, shutdown: ShutdownSignal) -> Self {
        Self { delay, shutdown }
    }

    /// Sends every pixel of `stream` into `sink`, in order.
    ///
    /// Stops at the first rejected send (`StreamClosed`) or on shutdown
    /// (`ShuttingDown`). The delay is a plain sleep raced against both, so a
    /// disconnect is noticed within one item's delay. Returns the number of
    /// pixels delivered.
    pub async fn emit<S>(&mut self, stream: AreaStream, sink: &mut S) -> Result<usize, SatelliteError>
    where
        S: PixelSink + ?Sized,
    {
        let total = stream.len();
        let mut sent = 0usize;

        for pixel in stream {
            tokio::select! {
                biased;
                () = self.shutdown.wait() => return Err(SatelliteError::ShuttingDown),
                result = sink.send(pixel) => result?,
            }
            sent += 1;

            if !self.delay.is_zero() {
                tokio::select! {
                    biased;
                    () = self.shutdown.wait() => return Err(SatelliteError::ShuttingDown),
                    () = sink.closed() => {
                        debug!(sent, total, "Consumer left during delay");
                        return Err(SatelliteError::StreamClosed);
                    }
                    () = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        info!(sent, "Area stream completed");
        Ok(sent)
    }
}
