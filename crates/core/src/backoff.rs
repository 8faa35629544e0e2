// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff arithmetic.

use std::time::Duration;

/// Upper bound applied when no explicit cap is configured.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(300);

/// Exponential backoff: `base * 2^exponent`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay for exponent 0.
    pub base: Duration,
    /// Cap on any single delay.
    pub max: Duration,
}

impl Backoff {
    /// Creates a backoff with the given base and the default cap.
    pub fn new(base: Duration) -> Self {
        Backoff {
            base,
            max: DEFAULT_MAX_DELAY,
        }
    }

    /// Creates a backoff from a base in milliseconds.
    pub fn from_millis(base_ms: u64) -> Self {
        Self::new(Duration::from_millis(base_ms))
    }

    /// Sets the cap.
    pub fn with_max(mut self, max: Duration) -> Self {
        self.max = max;
        self
    }

    /// Delay for the given exponent.
    pub fn delay(&self, exponent: u32) -> Duration {
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .map_or(self.max, |d| d.min(self.max))
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
