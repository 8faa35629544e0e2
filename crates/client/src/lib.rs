// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether - Client-side communication layer for a remote task service.
//!
//! # Main Components
//!
//! - [`RequestQueue`] - Priority queue with bounded concurrency and retry
//! - [`Poller`] - Tracks long-running remote tasks until they resolve
//! - [`Connection`] - Persistent duplex connection with reconnection
//! - [`Client`] - Facade owning one of each, built from a [`ClientConfig`]
//!
//! Network access goes through the [`Transport`] and [`Connector`] traits so
//! that every component can be exercised against in-memory mocks.
//!
//! ```rust,ignore
//! use tether::{Client, ClientConfig, RequestDescriptor};
//!
//! let client = Client::new(ClientConfig::load(None)?)?;
//! let job = client.submit(RequestDescriptor::post("/jobs", body), 5).await?;
//! client.track_task("job-1", "/jobs/job-1", client.poll_options())?;
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod channel;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod poller;
pub mod queue;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use channel::{ChannelError, ChannelPair, Connector, WebSocketConnector};
pub use client::Client;
pub use config::ClientConfig;
pub use connection::{
    Connection, ConnectionConfig, ConnectionEvent, ConnectionState, EventKind, ListenerId,
};
pub use error::{Error, Result};
pub use poller::{PollDefaults, PollError, PollOptions, PollState, PollTask, Poller};
pub use queue::{QueueConfig, QueueError, QueueStatus, RequestHandle, RequestQueue};
pub use tether_core::{ErrorKind, Inbound, Outbound, PollStatus, RequestError, TaskStatus};
pub use transport::{HttpTransport, Method, RequestDescriptor, Response, Transport};

/// Locks a mutex, recovering the data if a holder panicked.
///
/// Guards are never held across an await point.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
