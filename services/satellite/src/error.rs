//! Error handling module with type-safe, non-exhaustive error types
//!
//! Every call-level failure is a [`SatelliteError`]. Each variant carries
//! the values needed for its message (offending coordinates or token) and
//! maps to exactly one [`ErrorCode`], which in turn maps to one gRPC status
//! code. Internal details are never exposed to callers.

use thiserror::Error;
use tonic::{Code, Status};
use uuid::Uuid;

use crate::geometry::Location;

/// Non-exhaustive error enum for forward compatibility
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SatelliteError {
    /// Coordinate outside the grid
    #[error("Out of range location received (x: {x}, y: {y})")]
    OutOfRange {
        /// Requested column
        x: i32,
        /// Requested row
        y: i32,
    },

    /// Area corners are inverted
    #[error("Invalid area received ({};{})->({};{})", .ll.x, .ll.y, .ur.x, .ur.y)]
    InvalidArea {
        /// Lower-left corner as received
        ll: Location,
        /// Upper-right corner as received
        ur: Location,
    },

    /// Call metadata is present but carries no usable token
    #[error("Invalid token format: no token provided")]
    AuthFailure,

    /// Token is not in the allow-list
    #[error("No permission associated with token ({token})")]
    PermissionDenied {
        /// The rejected token
        token: String,
    },

    /// Request message is structurally incomplete
    #[error("Malformed request: {reason}")]
    MalformedRequest {
        /// What is missing or wrong
        reason: String,
    },

    /// The consumer went away while pixels were being streamed
    #[error("Stream closed by consumer")]
    StreamClosed,

    /// The server is shutting down
    #[error("Server shutting down")]
    ShuttingDown,

    /// Internal error (details sanitized in responses)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Error codes for gRPC responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Coordinate outside the grid
    OutOfRange,
    /// Inverted area corners
    InvalidArea,
    /// Missing token
    AuthFailure,
    /// Unknown token
    PermissionDenied,
    /// Incomplete request message
    MalformedRequest,
    /// Consumer disconnected
    StreamClosed,
    /// Server draining
    ShuttingDown,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::InvalidArea => "INVALID_AREA",
            Self::AuthFailure => "AUTH_FAILURE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::StreamClosed => "STREAM_CLOSED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get the gRPC status code for this error
    #[must_use]
    pub const fn grpc_code(&self) -> Code {
        match self {
            Self::OutOfRange => Code::OutOfRange,
            Self::InvalidArea | Self::MalformedRequest => Code::InvalidArgument,
            Self::AuthFailure => Code::Unauthenticated,
            Self::PermissionDenied => Code::PermissionDenied,
            Self::StreamClosed => Code::Cancelled,
            Self::ShuttingDown => Code::Unavailable,
            Self::Internal => Code::Internal,
        }
    }
}

/// Structured error response with correlation ID
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Correlation ID for tracing
    pub correlation_id: Uuid,
}

impl ErrorResponse {
    /// Create a new error response from a `SatelliteError`
    #[must_use]
    pub fn from_error(error: &SatelliteError, correlation_id: Uuid) -> Self {
        let message = match error {
            // Never expose internal error details
            SatelliteError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        Self {
            code: error.code(),
            message,
            correlation_id,
        }
    }

    /// Convert to gRPC Status
    #[must_use]
    pub fn to_status(&self) -> Status {
        let message = format!("{} [correlation_id: {}]", self.message, self.correlation_id);
        Status::new(self.code.grpc_code(), message)
    }
}

impl SatelliteError {
    /// Get the error code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::InvalidArea { .. } => ErrorCode::InvalidArea,
            Self::AuthFailure => ErrorCode::AuthFailure,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Self::MalformedRequest { .. } => ErrorCode::MalformedRequest,
            Self::StreamClosed => ErrorCode::StreamClosed,
            Self::ShuttingDown => ErrorCode::ShuttingDown,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Convert to gRPC Status with correlation ID
    #[must_use]
    pub fn to_status(&self, correlation_id: Uuid) -> Status {
        ErrorResponse::from_error(self, correlation_id).to_status()
    }

    /// Shorthand for a malformed request
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            reason: reason.into(),
        }
    }
}
