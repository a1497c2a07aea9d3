//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies. The
//! client draws the map on stdout, so it sends its logs to stderr.

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard output
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

impl LogTarget {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Logging configuration for one binary.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Binary name, logged once at startup
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit one JSON object per event
    pub json_output: bool,
    /// Output stream
    pub target: LogTarget,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "satellite-server".to_string(),
            log_level: "info".to_string(),
            json_output: false,
            target: LogTarget::Stdout,
        }
    }
}

impl LoggingConfig {
    /// Server logging, taken from `LOG_LEVEL` and `LOG_JSON`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            json_output: config.log_json,
            ..Self::default()
        }
    }

    /// Client logging: warnings and above, on stderr.
    #[must_use]
    pub fn client() -> Self {
        Self {
            service_name: "satellite-client".to_string(),
            log_level: "warn".to_string(),
            json_output: false,
            target: LogTarget::Stderr,
        }
    }
}

/// Installs the global subscriber. Call once, at startup.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let writer = config.target.make_writer();

    if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true)
                    .with_thread_ids(true),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .try_init()?;
    }

    tracing::info!(service = %config.service_name, "Logging initialized");
    Ok(())
}
