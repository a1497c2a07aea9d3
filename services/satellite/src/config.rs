//! Type-Safe Configuration with Validation
//!
//! All server settings come from environment variables (a `.env` file is
//! honoured) and are validated once at startup. The resulting [`Config`] is
//! passed explicitly to every component; nothing reads the environment later.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::grid::{FillPolicy, GridDimensions};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Map width or height is zero
    #[error("Invalid map dimensions: width and height must be greater than 0")]
    InvalidDimensions,

    /// Invalid timeout value
    #[error("Invalid {name}: must be greater than 0")]
    InvalidTimeout {
        /// Variable name
        name: String,
    },

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Locations of the PEM files used for mutual TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// CA certificate that signs accepted client certificates
    pub ca_cert: PathBuf,
    /// Server certificate chain
    pub server_cert: PathBuf,
    /// Server private key
    pub server_key: PathBuf,
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Map text file
    pub map_path: PathBuf,
    /// Map size
    pub grid: GridDimensions,
    /// How short maps are handled
    pub map_fill: FillPolicy,
    /// Sleep after each streamed pixel
    pub stream_delay: Duration,
    /// Tokens allowed to query single points
    pub allowed_tokens: Vec<String>,
    /// mTLS material
    pub tls: TlsPaths,
    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8000)?,
            map_path: parse_env("MAP_PATH", PathBuf::from("map.txt"))?,
            grid: GridDimensions::new(parse_env("MAP_WIDTH", 80)?, parse_env("MAP_HEIGHT", 32)?),
            map_fill: parse_fill_env("MAP_FILL_PIXEL")?,
            stream_delay: Duration::from_millis(parse_env("STREAM_DELAY_MS", 0)?),
            allowed_tokens: parse_list_env("ALLOWED_TOKENS", &["03357-1"]),
            tls: TlsPaths {
                ca_cert: parse_env("CA_CERT_PATH", PathBuf::from("certs/ca-cert.pem"))?,
                server_cert: parse_env("SERVER_CERT_PATH", PathBuf::from("certs/server-cert.pem"))?,
                server_key: parse_env("SERVER_KEY_PATH", PathBuf::from("certs/server-key.pem"))?,
            },
            request_timeout_secs: parse_env("REQUEST_TIMEOUT", 30)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: parse_env("LOG_JSON", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Overrides the stream delay from the first command-line argument.
    ///
    /// `satellite-server 25` streams with a 25 ms pause between pixels.
    pub fn with_args<I>(mut self, mut args: I) -> Result<Self, ConfigError>
    where
        I: Iterator<Item = String>,
    {
        if let Some(arg) = args.next() {
            let millis: u64 = arg.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::ParseError {
                    name: "stream delay argument".to_string(),
                    reason: e.to_string(),
                }
            })?;
            self.stream_delay = Duration::from_millis(millis);
        }
        Ok(self)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if i32::try_from(self.grid.width).is_err() || i32::try_from(self.grid.height).is_err() {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.allowed_tokens.is_empty() {
            return Err(ConfigError::MissingRequired("ALLOWED_TOKENS".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "REQUEST_TIMEOUT".to_string(),
            });
        }
        if self.shutdown_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "SHUTDOWN_TIMEOUT".to_string(),
            });
        }
        Ok(())
    }

    /// Address to bind, as `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves [`Self::bind_address`], looking `HOST` up when it is a name.
    pub async fn resolve_bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let target = self.bind_address();
        let unresolved = |reason: String| ConfigError::ParseError {
            name: "HOST".to_string(),
            reason,
        };

        let addr = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| unresolved(format!("cannot resolve {target}: {e}")))?
            .next()
            .ok_or_else(|| unresolved(format!("{target} resolved to no addresses")));
        addr
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Parse an environment variable with a default value.
pub(crate) fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated list environment variable.
fn parse_list_env(name: &str, default: &[&str]) -> Vec<String> {
    env::var(name).map_or_else(
        |_| default.iter().map(ToString::to_string).collect(),
        |v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        },
    )
}

/// Parse the optional fill pixel; a single ASCII character enables padding.
fn parse_fill_env(name: &str) -> Result<FillPolicy, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(FillPolicy::Strict),
        Ok(val) => parse_fill(name, &val),
    }
}

fn parse_fill(name: &str, val: &str) -> Result<FillPolicy, ConfigError> {
    match val.as_bytes() {
        [byte] if byte.is_ascii() => Ok(FillPolicy::Pad(*byte)),
        _ => Err(ConfigError::ParseError {
            name: name.to_string(),
            reason: format!("expected a single ASCII character, got {val:?}"),
        }),
    }
}
