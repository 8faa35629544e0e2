// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors reported by `tether` commands.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] tether::Error),

    #[error(transparent)]
    Core(#[from] tether_core::Error),

    #[error(transparent)]
    Request(#[from] tether::QueueError),

    #[error(transparent)]
    Poll(#[from] tether::PollError),

    #[error("invalid method: '{0}'\n  hint: valid methods are: GET, POST, PUT, PATCH, DELETE")]
    InvalidMethod(String),

    #[error("invalid request body: {0}\n  hint: --body takes a JSON document")]
    InvalidBody(serde_json::Error),

    #[error("connection to {0} lost after exhausting reconnect attempts")]
    ConnectionLost(String),

    #[error("interrupted")]
    Interrupted,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for `tether` commands.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
