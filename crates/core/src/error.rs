// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by the tether crates.
//!
//! Every failure the communication layer reports falls into one of four
//! classes (see [`ErrorKind`]). The class is carried by the error variant
//! itself so that retry decisions never depend on message text.

use thiserror::Error;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retryable: network blips, server errors, timeouts.
    Transient,
    /// Surfaced immediately: malformed input, reported failure, exhaustion.
    Terminal,
    /// Work was withdrawn before it started.
    Cancelled,
    /// An option value was rejected.
    Configuration,
}

/// Error produced by a single request/response exchange.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The remote could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-2xx status.
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The operation reported a failure that must not be retried.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl RequestError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        RequestError::Http {
            status,
            message: message.into(),
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Network(_) | RequestError::Http { .. } | RequestError::Protocol(_) => {
                ErrorKind::Transient
            }
            RequestError::Rejected(_) => ErrorKind::Terminal,
        }
    }

    /// Returns true if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// General errors for configuration and serialization.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a configuration error for the named field.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig { .. } => ErrorKind::Configuration,
            Error::Json(_) | Error::Io(_) => ErrorKind::Terminal,
        }
    }
}

/// A specialized Result type for tether-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
