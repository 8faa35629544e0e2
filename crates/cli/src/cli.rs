// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const QUICKSTART_HELP: &str = "\
Get started:
  tether config                              Show the effective configuration
  tether request GET /health                 Send a request through the queue
  tether poll job-1 --status-path /jobs/job-1  Wait for a remote task
  tether watch --type progress               Stream socket events";

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a count that must be at least 1.
fn positive_u32(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Parse a duration in milliseconds that must be greater than 0.
fn positive_u64(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Parser, Debug)]
#[command(name = "tether", version)]
#[command(about = "Talk to a remote task service: queued requests, task polling and live events")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: $XDG_CONFIG_HOME/tether/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override base_url
    #[arg(long, global = true, value_name = "URL", value_parser = non_empty_string)]
    pub base_url: Option<String>,

    /// Override socket_url
    #[arg(long, global = true, value_name = "URL", value_parser = non_empty_string)]
    pub socket_url: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a request through the queue and print the response body
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Path relative to base_url
        #[arg(value_parser = non_empty_string)]
        path: String,

        /// JSON request body
        #[arg(long, short = 'd', value_name = "JSON")]
        body: Option<String>,

        /// Queue priority (higher starts first)
        #[arg(long, short = 'p', default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,

        /// Attempt the request once, without retries
        #[arg(long)]
        no_retry: bool,
    },

    /// Poll a remote task until it completes, fails or times out
    Poll {
        /// Task id
        #[arg(value_parser = non_empty_string)]
        task_id: String,

        /// Path answering the task's status
        #[arg(long, value_parser = non_empty_string)]
        status_path: String,

        /// Delay between checks in milliseconds
        #[arg(long, value_parser = positive_u64)]
        interval_ms: Option<u64>,

        /// Checks before giving up
        #[arg(long, value_parser = positive_u32)]
        max_attempts: Option<u32>,
    },

    /// Connect to socket_url and print events until interrupted
    Watch {
        /// Also print frames tagged with this type (repeatable)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        types: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
