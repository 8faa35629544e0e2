// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-core: Shared primitives for the tether client.
//!
//! This crate provides the error taxonomy, backoff arithmetic and wire
//! forms used by the `tether` communication layer and its CLI. It does no I/O.

pub mod backoff;
pub mod error;
pub mod protocol;

pub use backoff::Backoff;
pub use error::{Error, ErrorKind, RequestError, Result};
pub use protocol::{Inbound, Outbound, PollStatus, TaskStatus};
