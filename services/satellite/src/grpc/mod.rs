//! gRPC Service Implementation
//!
//! Implements the `Satellite` service on top of [`QueryService`]: call
//! metadata becomes an explicit `Option<AuthContext>`, domain errors become
//! statuses with correlation IDs, and area streams are pumped through a
//! bounded channel so ordering and backpressure follow the client.

pub mod convert;
pub mod sink;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};
use tracing::field::{display, Empty};
use tracing::{error, info, instrument, warn, Instrument, Span};
use uuid::Uuid;

use crate::auth::{AllowList, AuthContext, AuthorizationGate, TOKEN_METADATA_KEY};
use crate::config::Config;
use crate::error::SatelliteError;
use crate::geometry::{Area, Location};
use crate::grid::Grid;
use crate::mtls::PeerIdentity;
use crate::observability::ServiceMetrics;
use crate::proto;
use crate::proto::satellite_server::Satellite;
use crate::query::{Pacer, QueryService};
use crate::shutdown::ShutdownSignal;

pub use sink::{ChannelSink, ABORT_TIMEOUT, STREAM_BUFFER};

const GET_IMAGE: &str = "GetImage";
const GET_IMAGES: &str = "GetImages";

/// Satellite service implementation.
#[derive(Debug, Clone)]
pub struct SatelliteServiceImpl {
    query: QueryService,
    pacer: Pacer,
    metrics: Arc<ServiceMetrics>,
}

impl SatelliteServiceImpl {
    /// Creates the service from its parts.
    #[must_use]
    pub const fn new(query: QueryService, pacer: Pacer, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            query,
            pacer,
            metrics,
        }
    }

    /// Wires the service from configuration and a loaded grid.
    pub fn from_config(
        config: &Config,
        grid: Arc<Grid>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, SatelliteError> {
        let gate = AuthorizationGate::new(AllowList::new(config.allowed_tokens.iter().cloned()));
        let metrics = ServiceMetrics::new()
            .map_err(|e| SatelliteError::Internal(anyhow::anyhow!("metrics registry: {e}")))?;

        Ok(Self::new(
            QueryService::new(grid, gate),
            Pacer::new(config.stream_delay, shutdown),
            Arc::new(metrics),
        ))
    }

    /// Metrics recorded by this service.
    #[must_use]
    pub fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }

    /// Generates a new correlation ID for request tracing.
    fn generate_correlation_id() -> Uuid {
        Uuid::new_v4()
    }

    /// Builds the authorization view of a call's metadata.
    ///
    /// A call with no metadata entries at all yields `None`, which the gate
    /// treats as the unauthenticated fallback. Calls arriving over HTTP/2
    /// always carry protocol headers, so they always yield `Some`.
    #[must_use]
    pub fn auth_context(metadata: &MetadataMap) -> Option<AuthContext> {
        if metadata.is_empty() {
            return None;
        }

        let ctx = match metadata.get(TOKEN_METADATA_KEY) {
            None => AuthContext::without_token(),
            Some(value) => value
                .to_str()
                .map_or_else(|_| AuthContext::with_unreadable_token(), AuthContext::with_token),
        };
        Some(ctx)
    }

    /// Tags the current span with the call identity.
    fn enter_call<T>(request: &Request<T>) -> Uuid {
        let correlation_id = Self::generate_correlation_id();
        let span = Span::current();
        span.record("correlation_id", display(correlation_id));
        if let Some(peer) = PeerIdentity::from_request(request) {
            span.record("peer", peer.subject.as_str());
        }
        correlation_id
    }

    /// Logs, counts and converts a failed call.
    fn fail(&self, method: &str, err: &SatelliteError, correlation_id: Uuid, started: Instant) -> Status {
        error!(
            error = %err,
            error_type = err.code().as_str(),
            correlation_id = %correlation_id,
            "{method} failed"
        );
        self.metrics
            .record_request(method, err.code().as_str(), started.elapsed().as_secs_f64());
        err.to_status(correlation_id)
    }
}

#[tonic::async_trait]
impl Satellite for SatelliteServiceImpl {
    type GetImagesStream = ReceiverStream<Result<proto::Image, Status>>;

    #[instrument(skip_all, fields(correlation_id = Empty, peer = Empty))]
    async fn get_image(
        &self,
        request: Request<proto::Location>,
    ) -> Result<Response<proto::Image>, Status> {
        let started = Instant::now();
        let correlation_id = Self::enter_call(&request);
        let ctx = Self::auth_context(request.metadata());
        let loc = Location::from(request.into_inner());

        info!(x = loc.x, y = loc.y, "GetImage request");

        match self.query.get_point(loc, ctx.as_ref()) {
            Ok(pixel) => {
                self.metrics
                    .record_request(GET_IMAGE, "ok", started.elapsed().as_secs_f64());
                Ok(Response::new(proto::Image::from(pixel)))
            }
            Err(err) => Err(self.fail(GET_IMAGE, &err, correlation_id, started)),
        }
    }

    #[instrument(skip_all, fields(correlation_id = Empty, peer = Empty))]
    async fn get_images(
        &self,
        request: Request<proto::Area>,
    ) -> Result<Response<Self::GetImagesStream>, Status> {
        let started = Instant::now();
        let correlation_id = Self::enter_call(&request);

        let area = Area::try_from(request.into_inner())
            .map_err(|err| self.fail(GET_IMAGES, &err, correlation_id, started))?;

        info!(ll = %area.ll, ur = %area.ur, "GetImages stream request");

        let stream = self
            .query
            .stream_area(area)
            .map_err(|err| self.fail(GET_IMAGES, &err, correlation_id, started))?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let mut sink = ChannelSink::new(tx, Arc::clone(&self.metrics));
        let mut pacer = self.pacer.clone();
        let metrics = Arc::clone(&self.metrics);

        metrics.stream_started();
        tokio::spawn(
            async move {
                let status = match pacer.emit(stream, &mut sink).await {
                    Ok(_) => "ok",
                    Err(SatelliteError::StreamClosed) => {
                        info!("Client went away, area stream stopped");
                        SatelliteError::StreamClosed.code().as_str()
                    }
                    Err(err) => {
                        warn!(error = %err, "Area stream aborted");
                        let code = err.code().as_str();
                        sink.abort(err.to_status(correlation_id)).await;
                        code
                    }
                };
                metrics.record_request(GET_IMAGES, status, started.elapsed().as_secs_f64());
                metrics.stream_finished();
            }
            .instrument(Span::current()),
        );

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
