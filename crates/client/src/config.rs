// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored as TOML, by default in
//! `$XDG_CONFIG_HOME/tether/config.toml`:
//!
//! ```toml
//! base_url = "https://api.example.com"
//! socket_url = "wss://api.example.com/socket"
//! request_timeout_ms = 30000
//!
//! [queue]
//! max_concurrent = 5
//! retry_attempts = 3
//! retry_delay_ms = 1000
//!
//! [poll]
//! interval_ms = 2000
//! max_attempts = 300
//!
//! [connection]
//! max_reconnect_attempts = 5
//! reconnect_delay_ms = 1000
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};
use crate::poller::PollDefaults;
use crate::queue::QueueConfig;

const CONFIG_DIR_NAME: &str = "tether";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL request paths are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Endpoint of the persistent connection (`ws://` or `wss://`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_url: Option<String>,
    /// Timeout for a single HTTP exchange in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub poll: PollDefaults,
    #[serde(default)]
    pub connection: ConnectionConfig,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: default_base_url(),
            socket_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            queue: QueueConfig::default(),
            poll: PollDefaults::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes configuration to TOML text.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads configuration.
    ///
    /// With an explicit `path` the file must exist. Without one the default
    /// location is used, and a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::ConfigNotFound(path.display().to_string()));
                }
                Self::read(path)
            }
            None => match default_path() {
                Some(path) if path.is_file() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Checks every option value.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(tether_core::Error::invalid_config(
                "base_url",
                format!("must be an http:// or https:// URL, got '{}'", self.base_url),
            )
            .into());
        }
        if let Some(ref url) = self.socket_url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(tether_core::Error::invalid_config(
                    "socket_url",
                    format!("must be a ws:// or wss:// URL, got '{}'", url),
                )
                .into());
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(
                tether_core::Error::invalid_config("request_timeout_ms", "must be greater than 0")
                    .into(),
            );
        }
        self.queue.validate()?;
        self.poll.validate()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Default config file location, if a config directory is known.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
