// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tether_core::{ErrorKind, RequestError};
use thiserror::Error;

/// Errors returned by the tether client outside of queued requests and polls.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tether_core::Error),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no socket_url configured\n  hint: set socket_url in the config file or pass --socket-url")]
    NoSocketUrl,
}

impl Error {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Core(e) => e.kind(),
            Error::Request(e) => e.kind(),
            Error::ConfigParse(_) | Error::ConfigNotFound(_) | Error::NoSocketUrl => {
                ErrorKind::Configuration
            }
            Error::ConfigSerialize(_) | Error::Io(_) => ErrorKind::Terminal,
        }
    }
}

/// A specialized Result type for tether operations.
pub type Result<T> = std::result::Result<T, Error>;
