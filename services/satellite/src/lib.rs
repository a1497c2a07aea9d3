//! Satellite Service - pixel queries over an in-memory satellite map.
//!
//! A fixed-size character grid is loaded once at startup and served over
//! gRPC with mutual TLS: single-point reads gated by a token allow-list,
//! and paced, cancellable area streams. The client half of the crate drives
//! both RPCs and renders the returned pixels.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod grpc;
pub mod mtls;
pub mod observability;
pub mod query;
pub mod shutdown;
pub mod validation;

/// Generated protobuf code.
#[allow(missing_docs, clippy::pedantic, clippy::nursery)]
pub mod proto {
    tonic::include_proto!("satellite");
}

pub use config::Config;
pub use error::{ErrorCode, ErrorResponse, SatelliteError};
pub use geometry::{Area, Location, Pixel};
pub use grid::{Grid, GridDimensions};
pub use grpc::SatelliteServiceImpl;
pub use query::{AreaStream, Pacer, PixelSink, QueryService};
