//! gRPC Service Tests
//!
//! Calls the `Satellite` implementation in-process: metadata handling,
//! status mapping with correlation IDs, stream contents and cancellation.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use satellite::auth::{AllowList, AuthorizationGate, TOKEN_METADATA_KEY};
use satellite::grid::{FillPolicy, GridDimensions, GridLoader};
use satellite::grpc::SatelliteServiceImpl;
use satellite::observability::ServiceMetrics;
use satellite::proto;
use satellite::proto::satellite_server::Satellite;
use satellite::query::{Pacer, QueryService};
use satellite::shutdown::{ShutdownCoordinator, ShutdownSignal};
use tokio_stream::StreamExt;
use tonic::{Code, Request};

const ALLOWED: &str = "03357-1";

fn map_text(width: usize, height: usize) -> String {
    (0..height)
        .map(|row| {
            let fill = char::from(b'a' + u8::try_from(row % 26).unwrap());
            format!("{}\n", fill.to_string().repeat(width))
        })
        .collect()
}

fn service_with(dims: GridDimensions, delay: Duration, shutdown: ShutdownSignal) -> SatelliteServiceImpl {
    let grid = GridLoader::new(dims, FillPolicy::Strict)
        .load_reader(Cursor::new(map_text(dims.width, dims.height)))
        .unwrap();
    let query = QueryService::new(
        Arc::new(grid),
        AuthorizationGate::new(AllowList::new([ALLOWED])),
    );
    SatelliteServiceImpl::new(
        query,
        Pacer::new(delay, shutdown),
        Arc::new(ServiceMetrics::new().unwrap()),
    )
}

fn service() -> SatelliteServiceImpl {
    service_with(GridDimensions::new(8, 4), Duration::ZERO, ShutdownSignal::never())
}

fn location(x: i32, y: i32) -> proto::Location {
    proto::Location { x, y }
}

fn area(llx: i32, lly: i32, urx: i32, ury: i32) -> proto::Area {
    proto::Area {
        ll: Some(location(llx, lly)),
        ur: Some(location(urx, ury)),
    }
}

fn with_metadata<T>(message: T, key: &'static str, value: &str) -> Request<T> {
    let mut request = Request::new(message);
    request
        .metadata_mut()
        .insert(key, value.parse().unwrap());
    request
}

// ============================================================================
// GetImage
// ============================================================================

#[tokio::test]
async fn test_get_image_without_metadata() {
    let image = service()
        .get_image(Request::new(location(7, 0)))
        .await
        .unwrap()
        .into_inner();

    // Bottom row comes from the last line of the map text
    assert_eq!((image.x, image.y), (7, 0));
    assert_eq!(image.img, b"d".to_vec());
}

#[tokio::test]
async fn test_get_image_with_allowed_token() {
    let request = with_metadata(location(0, 3), TOKEN_METADATA_KEY, ALLOWED);
    let image = service().get_image(request).await.unwrap().into_inner();
    assert_eq!(image.img, b"a".to_vec());
}

#[tokio::test]
async fn test_get_image_metadata_without_token() {
    let request = with_metadata(location(0, 0), "x-request-id", "abc");
    let status = service().get_image(request).await.unwrap_err();

    assert_eq!(status.code(), Code::Unauthenticated);
    assert!(status
        .message()
        .starts_with("Invalid token format: no token provided [correlation_id: "));
}

#[tokio::test]
async fn test_get_image_unknown_token() {
    let request = with_metadata(location(0, 0), TOKEN_METADATA_KEY, "unknown");
    let status = service().get_image(request).await.unwrap_err();

    assert_eq!(status.code(), Code::PermissionDenied);
    assert!(status
        .message()
        .starts_with("No permission associated with token (unknown)"));
}

#[tokio::test]
async fn test_get_image_out_of_range() {
    let status = service()
        .get_image(Request::new(location(8, 0)))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::OutOfRange);
    assert!(status
        .message()
        .starts_with("Out of range location received (x: 8, y: 0)"));
}

#[tokio::test]
async fn test_get_image_records_metrics() {
    let svc = service();
    svc.get_image(Request::new(location(0, 0))).await.unwrap();
    svc.get_image(Request::new(location(-1, 0))).await.unwrap_err();

    let metrics = svc.metrics();
    let ok = metrics.request_count.with_label_values(&["GetImage", "ok"]).get();
    let failed = metrics
        .request_count
        .with_label_values(&["GetImage", "OUT_OF_RANGE"])
        .get();
    assert!((ok - 1.0).abs() < f64::EPSILON);
    assert!((failed - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_auth_context_from_metadata() {
    let empty = tonic::metadata::MetadataMap::new();
    assert!(SatelliteServiceImpl::auth_context(&empty).is_none());

    let request = with_metadata((), TOKEN_METADATA_KEY, ALLOWED);
    let ctx = SatelliteServiceImpl::auth_context(request.metadata()).unwrap();
    assert_eq!(ctx.token(), Some(ALLOWED));

    let request = with_metadata((), "user-agent", "grpc-rust");
    let ctx = SatelliteServiceImpl::auth_context(request.metadata()).unwrap();
    assert_eq!(ctx.token(), None);
}

// ============================================================================
// GetImages
// ============================================================================

#[tokio::test]
async fn test_get_images_streams_area_in_order() {
    let stream = service()
        .get_images(Request::new(area(0, 0, 2, 2)))
        .await
        .unwrap()
        .into_inner();

    let images: Vec<proto::Image> = stream.map(Result::unwrap).collect().await;
    let coords: Vec<(i32, i32)> = images.iter().map(|i| (i.x, i.y)).collect();

    assert_eq!(coords, vec![(0, 2), (1, 2), (0, 1), (1, 1)]);
    assert_eq!(images[0].img, b"b".to_vec());
    assert_eq!(images[2].img, b"c".to_vec());
}

#[tokio::test]
async fn test_get_images_empty_area_completes() {
    let stream = service()
        .get_images(Request::new(area(5, 3, 5, 3)))
        .await
        .unwrap()
        .into_inner();

    let images: Vec<_> = stream.collect().await;
    assert!(images.is_empty());
}

#[tokio::test]
async fn test_get_images_ignores_tokens() {
    let request = with_metadata(area(0, 0, 1, 1), TOKEN_METADATA_KEY, "unknown");
    let stream = service().get_images(request).await.unwrap().into_inner();
    assert_eq!(stream.collect::<Vec<_>>().await.len(), 1);
}

#[tokio::test]
async fn test_get_images_rejects_before_streaming() {
    let svc = service();

    let status = svc.get_images(Request::new(area(0, 0, 8, 3))).await.unwrap_err();
    assert_eq!(status.code(), Code::OutOfRange);

    let status = svc.get_images(Request::new(area(3, 0, 2, 3))).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().starts_with("Invalid area received (3;0)->(2;3)"));

    let missing = proto::Area {
        ll: None,
        ur: Some(location(1, 1)),
    };
    let status = svc.get_images(Request::new(missing)).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_dropped_stream_stops_emission() {
    let svc = service_with(
        GridDimensions::new(10, 10),
        Duration::from_millis(20),
        ShutdownSignal::never(),
    );

    let mut stream = svc
        .get_images(Request::new(area(0, 0, 9, 9)))
        .await
        .unwrap()
        .into_inner();
    assert!(stream.next().await.is_some());
    drop(stream);

    let metrics = svc.metrics();
    tokio::time::timeout(Duration::from_secs(1), async {
        while metrics.active_streams.get() > 0.5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(metrics.pixels_streamed.get() < 81);
    let closed = metrics
        .request_count
        .with_label_values(&["GetImages", "STREAM_CLOSED"])
        .get();
    assert!((closed - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_shutdown_ends_stream_with_unavailable() {
    let coordinator = ShutdownCoordinator::new();
    let svc = service_with(
        GridDimensions::new(10, 10),
        Duration::from_millis(20),
        coordinator.subscribe(),
    );

    let mut stream = svc
        .get_images(Request::new(area(0, 0, 9, 9)))
        .await
        .unwrap()
        .into_inner();
    assert!(stream.next().await.unwrap().is_ok());

    coordinator.trigger();

    let last = tokio::time::timeout(Duration::from_secs(1), async {
        let mut last = None;
        while let Some(item) = stream.next().await {
            last = Some(item);
        }
        last
    })
    .await
    .unwrap();

    let status = last.unwrap().unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
}

#[tokio::test]
async fn test_shutdown_status_follows_buffered_pixels() {
    let coordinator = ShutdownCoordinator::new();
    let svc = service_with(
        GridDimensions::new(10, 10),
        Duration::ZERO,
        coordinator.subscribe(),
    );

    let stream = svc
        .get_images(Request::new(area(0, 0, 9, 9)))
        .await
        .unwrap()
        .into_inner();

    // Let the channel fill up while nobody reads
    tokio::time::sleep(Duration::from_millis(100)).await;
    coordinator.trigger();

    let items: Vec<_> = tokio::time::timeout(Duration::from_secs(1), stream.collect())
        .await
        .unwrap();

    let pixels = items.iter().take_while(|item| item.is_ok()).count();
    assert!(pixels < 81);
    assert_eq!(items.len(), pixels + 1);
    let status = items.last().unwrap().as_ref().unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
}
