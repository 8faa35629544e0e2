// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-cli - Command-line front end for the `tether` client.
//!
//! Every command resolves a [`tether::ClientConfig`] (flags over `TETHER_*`
//! environment variables over the config file), builds a [`tether::Client`]
//! and prints its results to stdout: JSON for data, TOML for `config`.
//! Diagnostics go to stderr through `tracing`.

mod cli;
mod commands;
mod env;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command, GlobalArgs};
pub use commands::load_config;
pub use error::{Error, Result};

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(&cli.global)?;

    match cli.command {
        Command::Request {
            method,
            path,
            body,
            priority,
            no_retry,
        } => {
            commands::request::run(config, &method, &path, body.as_deref(), priority, no_retry)
                .await
        }
        Command::Poll {
            task_id,
            status_path,
            interval_ms,
            max_attempts,
        } => commands::poll::run(config, &task_id, &status_path, interval_ms, max_attempts).await,
        Command::Watch { types } => commands::watch::run(config, &types).await,
        Command::Config => commands::config::run(&config),
    }
}
