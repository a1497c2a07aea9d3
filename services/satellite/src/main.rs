//! Satellite Service - Main Entry Point
//!
//! Loads the map and mTLS material, then serves point and area queries
//! until SIGINT/SIGTERM.

use std::sync::Arc;

use satellite::config::Config;
use satellite::grid::GridLoader;
use satellite::grpc::SatelliteServiceImpl;
use satellite::mtls::ServerCredentials;
use satellite::observability::{init_logging, LoggingConfig};
use satellite::proto::satellite_server::SatelliteServer;
use satellite::shutdown::{run_with_graceful_shutdown, ShutdownCoordinator};
use tonic::transport::Server;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration; the first argument overrides the stream delay
    let config = Config::from_env()?.with_args(std::env::args().skip(1))?;

    init_logging(&LoggingConfig::from_config(&config))?;

    info!(
        map = %config.map_path.display(),
        width = config.grid.width,
        height = config.grid.height,
        stream_delay = ?config.stream_delay,
        "Starting Satellite Service"
    );

    let grid = GridLoader::new(config.grid, config.map_fill).load_file(&config.map_path)?;
    let credentials = ServerCredentials::load(&config.tls)?;

    let addr = config.resolve_bind_address().await?;

    let shutdown_coordinator = ShutdownCoordinator::new();
    let service = SatelliteServiceImpl::from_config(
        &config,
        Arc::new(grid),
        shutdown_coordinator.subscribe(),
    )?;
    let metrics = service.metrics().clone();

    info!("Satellite Service listening on {}", addr);

    let server = Server::builder()
        .tls_config(credentials.server_tls_config())?
        .timeout(config.request_timeout())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_grpc()).into_inner())
        .add_service(SatelliteServer::new(service))
        .serve_with_shutdown(addr, shutdown_coordinator.subscribe().recv());

    run_with_graceful_shutdown(server, &shutdown_coordinator, config.shutdown_timeout()).await;

    match metrics.encode_text() {
        Ok(snapshot) => info!(metrics = %snapshot, "Final metrics snapshot"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }

    info!("Satellite Service stopped");

    Ok(())
}
