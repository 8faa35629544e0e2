// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tether::ClientConfig;

use crate::error::Result;

/// Prints the effective configuration as TOML.
pub fn run(config: &ClientConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
