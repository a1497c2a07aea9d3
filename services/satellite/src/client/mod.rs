//! Satellite Client
//!
//! mTLS proxy for both RPCs and a terminal canvas that renders streamed
//! pixels row by row as they arrive.

pub mod canvas;
pub mod proxy;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tonic::{Code, Status};
use url::Url;

use crate::config::{parse_env, ConfigError};
use crate::error::SatelliteError;
use crate::grid::GridDimensions;
use crate::mtls::CredentialsError;

pub use canvas::MapCanvas;
pub use proxy::{PixelStream, SatelliteProxy};

const DEFAULT_SERVER_URL: &str = "https://localhost:8000";

/// Client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// mTLS material could not be loaded
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The server URL is not a usable endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection setup failed
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The token cannot be sent as call metadata
    #[error("Token is not a valid metadata value")]
    InvalidToken,

    /// The server answered with an error status
    #[error("{}", describe_status(.0))]
    Rpc(#[from] Status),

    /// The server sent a message that is not a pixel
    #[error("Invalid response: {0}")]
    InvalidResponse(#[source] SatelliteError),
}

impl ClientError {
    /// gRPC code of a server-side failure, if this is one.
    #[must_use]
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc(status) => Some(status.code()),
            _ => None,
        }
    }
}

/// Human-readable explanation of a failed call.
#[must_use]
pub fn describe_status(status: &Status) -> String {
    match status.code() {
        Code::OutOfRange => format!("Bad request, out of bound location: {}", status.message()),
        Code::InvalidArgument => format!("Bad request: {}", status.message()),
        Code::Unauthenticated => format!("Not authenticated: {}", status.message()),
        Code::PermissionDenied => format!("Permission denied: {}", status.message()),
        Code::DeadlineExceeded => {
            "Deadline exceeded, reduce the server stream delay".to_string()
        }
        code => format!("Unexpected error ({code:?}): {}", status.message()),
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server endpoint
    pub server_url: Url,
    /// Name expected in the server certificate
    pub tls_domain: String,
    /// CA certificate that signed the server certificate
    pub ca_cert: PathBuf,
    /// Client certificate chain
    pub client_cert: PathBuf,
    /// Client private key
    pub client_key: PathBuf,
    /// Token sent with point queries
    pub token: String,
    /// Deadline for each point query
    pub point_timeout: Duration,
    /// Deadline for a whole area stream
    pub stream_timeout: Duration,
    /// Size of the map to render
    pub grid: GridDimensions,
}

impl ClientConfig {
    /// Loads client configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_url: String = parse_env("SATELLITE_SERVER_URL", DEFAULT_SERVER_URL.to_string())?;
        let server_url = Url::parse(&raw_url).map_err(|e| ConfigError::ParseError {
            name: "SATELLITE_SERVER_URL".to_string(),
            reason: e.to_string(),
        })?;

        let config = Self {
            server_url,
            tls_domain: env::var("TLS_DOMAIN").unwrap_or_else(|_| "localhost".to_string()),
            ca_cert: parse_env("CA_CERT_PATH", PathBuf::from("certs/ca-cert.pem"))?,
            client_cert: parse_env("CLIENT_CERT_PATH", PathBuf::from("certs/client-cert.pem"))?,
            client_key: parse_env("CLIENT_KEY_PATH", PathBuf::from("certs/client-key.pem"))?,
            token: env::var("SATELLITE_TOKEN").unwrap_or_else(|_| "03357-1".to_string()),
            point_timeout: Duration::from_millis(parse_env("POINT_TIMEOUT_MS", 40)?),
            stream_timeout: Duration::from_secs(parse_env("STREAM_TIMEOUT", 10)?),
            grid: GridDimensions::new(parse_env("MAP_WIDTH", 80)?, parse_env("MAP_HEIGHT", 32)?),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.scheme() != "https" {
            return Err(ConfigError::ParseError {
                name: "SATELLITE_SERVER_URL".to_string(),
                reason: format!("mutual TLS needs an https URL, got {}", self.server_url),
            });
        }
        if self.token.is_empty() {
            return Err(ConfigError::MissingRequired("SATELLITE_TOKEN".to_string()));
        }
        if self.point_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                name: "POINT_TIMEOUT_MS".to_string(),
            });
        }
        if self.stream_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                name: "STREAM_TIMEOUT".to_string(),
            });
        }
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        Ok(())
    }
}
