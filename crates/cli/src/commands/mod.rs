// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod poll;
pub mod request;
pub mod watch;

use serde::Serialize;
use tether::ClientConfig;

use crate::cli::GlobalArgs;
use crate::env;
use crate::error::Result;

/// Resolves the effective configuration.
///
/// Precedence, highest first: command-line flags, `TETHER_*` environment
/// variables, the config file, built-in defaults.
pub fn load_config(global: &GlobalArgs) -> Result<ClientConfig> {
    let path = global.config.clone().or_else(env::config_path);
    let mut config = ClientConfig::load(path.as_deref())?;

    if let Some(url) = global.base_url.clone().or_else(env::base_url) {
        config.base_url = url;
    }
    if let Some(url) = global.socket_url.clone().or_else(env::socket_url) {
        config.socket_url = Some(url);
    }

    config.validate()?;
    Ok(config)
}

/// Prints a value as one line of JSON.
pub(crate) fn print_json_line<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
