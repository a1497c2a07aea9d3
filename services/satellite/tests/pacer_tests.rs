//! Pacer Tests
//!
//! Drives area streams into in-memory sinks to check ordering, pacing,
//! consumer disconnects and shutdown.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use satellite::auth::{AllowList, AuthorizationGate};
use satellite::geometry::{Area, Location, Pixel};
use satellite::grid::{FillPolicy, GridDimensions, GridLoader};
use satellite::query::{AreaStream, Pacer, PixelSink, QueryService};
use satellite::shutdown::{ShutdownCoordinator, ShutdownSignal};
use satellite::SatelliteError;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

/// Collects pixels; refuses sends once `limit` pixels have arrived.
struct RecordingSink {
    pixels: Vec<Pixel>,
    limit: Option<usize>,
    gone: Arc<Notify>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            pixels: Vec::new(),
            limit: None,
            gone: Arc::new(Notify::new()),
        }
    }

    fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }
}

#[async_trait]
impl PixelSink for RecordingSink {
    async fn send(&mut self, pixel: Pixel) -> Result<(), SatelliteError> {
        if self.limit.is_some_and(|limit| self.pixels.len() >= limit) {
            return Err(SatelliteError::StreamClosed);
        }
        self.pixels.push(pixel);
        if self.limit == Some(self.pixels.len()) {
            self.gone.notify_one();
        }
        Ok(())
    }

    async fn closed(&self) {
        self.gone.notified().await;
    }
}

fn stream(width: usize, height: usize) -> AreaStream {
    let text: String = (0..height).map(|_| format!("{}\n", "#".repeat(width))).collect();
    let grid = GridLoader::new(GridDimensions::new(width, height), FillPolicy::Strict)
        .load_reader(Cursor::new(text))
        .unwrap();
    let svc = QueryService::new(Arc::new(grid), AuthorizationGate::new(AllowList::new(["t"])));

    let ur = Location::new(
        i32::try_from(width - 1).unwrap(),
        i32::try_from(height - 1).unwrap(),
    );
    svc.stream_area(Area::new(Location::new(0, 0), ur)).unwrap()
}

#[tokio::test]
async fn test_emit_delivers_every_pixel_in_order() {
    let area = stream(5, 4);
    let expected: Vec<Pixel> = area.clone().collect();

    let mut sink = RecordingSink::new();
    let mut pacer = Pacer::new(Duration::ZERO, ShutdownSignal::never());

    let sent = assert_ok!(pacer.emit(area, &mut sink).await);
    assert_eq!(sent, 12);
    assert_eq!(sink.pixels, expected);
}

#[tokio::test]
async fn test_emit_sleeps_between_pixels() {
    let mut sink = RecordingSink::new();
    let mut pacer = Pacer::new(Duration::from_millis(10), ShutdownSignal::never());

    let started = Instant::now();
    assert_ok!(pacer.emit(stream(3, 3), &mut sink).await);

    assert_eq!(sink.pixels.len(), 4);
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_closed_consumer_stops_within_one_delay() {
    let mut sink = RecordingSink::with_limit(3);
    let mut pacer = Pacer::new(Duration::from_millis(50), ShutdownSignal::never());

    let result = tokio::time::timeout(Duration::from_secs(1), pacer.emit(stream(10, 10), &mut sink))
        .await
        .unwrap();

    assert!(matches!(assert_err!(result), SatelliteError::StreamClosed));
    assert_eq!(sink.pixels.len(), 3);
}

#[tokio::test]
async fn test_rejected_send_stops_without_delay() {
    let mut sink = RecordingSink::with_limit(2);
    let mut pacer = Pacer::new(Duration::ZERO, ShutdownSignal::never());

    let err = assert_err!(pacer.emit(stream(4, 4), &mut sink).await);
    assert!(matches!(err, SatelliteError::StreamClosed));
    assert_eq!(sink.pixels.len(), 2);
}

#[tokio::test]
async fn test_shutdown_interrupts_delay() {
    let coordinator = ShutdownCoordinator::new();
    let mut pacer = Pacer::new(Duration::from_secs(5), coordinator.subscribe());
    let mut sink = RecordingSink::new();

    let emit = pacer.emit(stream(10, 10), &mut sink);
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.trigger();
    };

    let (result, ()) = tokio::time::timeout(Duration::from_secs(1), async { tokio::join!(emit, trigger) })
        .await
        .unwrap();

    assert!(matches!(result, Err(SatelliteError::ShuttingDown)));
    assert_eq!(sink.pixels.len(), 1);
}

#[tokio::test]
async fn test_shutdown_before_start_sends_nothing() {
    let coordinator = ShutdownCoordinator::new();
    coordinator.trigger();

    let mut pacer = Pacer::new(Duration::ZERO, coordinator.subscribe());
    let mut sink = RecordingSink::new();

    let err = assert_err!(pacer.emit(stream(3, 3), &mut sink).await);
    assert!(matches!(err, SatelliteError::ShuttingDown));
    assert!(sink.pixels.is_empty());
}

#[tokio::test]
async fn test_empty_stream_emits_nothing() {
    let mut sink = RecordingSink::new();
    let mut pacer = Pacer::new(Duration::from_secs(5), ShutdownSignal::never());

    let sent = assert_ok!(pacer.emit(stream(1, 1), &mut sink).await);
    assert_eq!(sent, 0);
}
