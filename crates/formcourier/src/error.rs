//! Error types for formcourier.
//!
//! This module defines all error types used throughout the formcourier crate.
//! The taxonomy mirrors the submission workflow: validation failures, rate
//! limit rejections, remote rejections, and transport failures are distinct
//! variants so callers can react to each differently.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for formcourier operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A required form field was empty after trimming.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// The email address does not look like an email address.
    #[error("invalid email address: {address}")]
    InvalidEmail {
        /// The rejected address.
        address: String,
    },

    // === Rate Limit Errors ===
    /// The daily submission cap has been reached.
    #[error("daily message limit reached ({cap} per day)")]
    DailyLimitReached {
        /// The configured daily cap.
        cap: u32,
    },

    /// The cooldown window since the last send has not elapsed.
    #[error("cooldown active: {remaining_ms}ms until the next send is allowed")]
    CooldownActive {
        /// Milliseconds until a send is permitted again.
        remaining_ms: i64,
    },

    // === Submission Errors ===
    /// Another submission is currently awaiting its response.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// The relay endpoint answered with a non-success status.
    #[error("relay rejected the message (HTTP {status}): {message}")]
    RemoteRejected {
        /// The HTTP status code returned by the relay.
        status: u16,
        /// Best-effort error message extracted from the response body.
        message: String,
    },

    /// The request never completed (DNS, connect, or read failure).
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    // === Store Errors ===
    /// Failed to read the persisted state file.
    #[error("failed to read state file {path}: {source}")]
    StoreRead {
        /// Path to the state file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the persisted state file.
    #[error("failed to write state file {path}: {source}")]
    StoreWrite {
        /// Path to the state file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for formcourier operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new missing-field validation error.
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create a new invalid-email validation error.
    #[must_use]
    pub fn invalid_email(address: impl Into<String>) -> Self {
        Self::InvalidEmail {
            address: address.into(),
        }
    }

    /// Create a new network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new remote-rejection error.
    #[must_use]
    pub fn remote_rejected(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            status,
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField { .. } | Self::InvalidEmail { .. })
    }

    /// Check if this error is a rate limit rejection.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::DailyLimitReached { .. } | Self::CooldownActive { .. }
        )
    }
}
