//! Channel-backed pixel sink feeding a server stream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tonic::Status;
use tracing::warn;

use crate::error::SatelliteError;
use crate::geometry::Pixel;
use crate::observability::ServiceMetrics;
use crate::proto::Image;
use crate::query::PixelSink;

/// Bound on pixels buffered ahead of a slow client.
pub const STREAM_BUFFER: usize = 16;

/// How long a terminal status waits for room behind buffered pixels.
pub const ABORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends pixels into the channel tonic drains for a `GetImages` response.
///
/// tonic drops the receiving half when the client goes away, which makes
/// every later send fail.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<Result<Image, Status>>,
    metrics: Arc<ServiceMetrics>,
}

impl ChannelSink {
    /// Wraps the sending half of a response channel.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<Result<Image, Status>>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { tx, metrics }
    }

    /// Ends the stream with an error status behind any buffered pixels.
    ///
    /// Waits up to [`ABORT_TIMEOUT`] for the client to make room. A client
    /// that is gone or never reads again gets no status.
    pub async fn abort(self, status: Status) {
        match tokio::time::timeout(ABORT_TIMEOUT, self.tx.send(Err(status))).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => warn!("Client left before the stream status was sent"),
            Err(_) => warn!(
                timeout = ?ABORT_TIMEOUT,
                "Stream status not delivered, client stopped reading"
            ),
        }
    }
}

#[async_trait]
impl PixelSink for ChannelSink {
    async fn send(&mut self, pixel: Pixel) -> Result<(), SatelliteError> {
        self.tx
            .send(Ok(Image::from(pixel)))
            .await
            .map_err(|_| SatelliteError::StreamClosed)?;
        self.metrics.record_pixel();
        Ok(())
    }

    async fn closed(&self) {
        self.tx.closed().await;
    }
}
