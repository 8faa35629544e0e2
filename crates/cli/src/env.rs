// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule. Empty values count as unset.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Returns the value of `TETHER_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::TETHER_CONFIG).map(PathBuf::from)
}

/// Returns the value of `TETHER_BASE_URL` if set.
pub fn base_url() -> Option<String> {
    non_empty(vars::TETHER_BASE_URL)
}

/// Returns the value of `TETHER_SOCKET_URL` if set.
pub fn socket_url() -> Option<String> {
    non_empty(vars::TETHER_SOCKET_URL)
}

/// Returns `true` if `RUST_LOG` is set.
pub fn log_filter_set() -> bool {
    non_empty(vars::RUST_LOG).is_some()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
