// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client facade wiring one queue, one poller and one connection.

use std::sync::Arc;

use tether_core::TaskStatus;

use crate::channel::{Connector, WebSocketConnector};
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::poller::{PollOptions, Poller};
use crate::queue::{RequestHandle, RequestQueue};
use crate::transport::{HttpTransport, RequestDescriptor, Response, Transport};

/// Communication layer for one remote service.
///
/// Generic over the transport and connector so tests can inject mocks.
pub struct Client<T: Transport = HttpTransport, C: Connector = WebSocketConnector> {
    config: ClientConfig,
    transport: Arc<T>,
    queue: RequestQueue,
    poller: Poller,
    connection: Connection<C>,
}

impl Client {
    /// Creates a client talking HTTP and WebSocket.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.base_url.clone(), config.request_timeout())?;
        Self::with_parts(config, transport, WebSocketConnector::new())
    }
}

impl<T: Transport + 'static, C: Connector> Client<T, C> {
    /// Creates a client from explicit parts.
    pub fn with_parts(config: ClientConfig, transport: T, connector: C) -> Result<Self> {
        config.validate()?;
        let queue = RequestQueue::new(config.queue.clone())?;
        let connection = Connection::with_connector(connector, config.connection.clone());
        Ok(Client {
            config,
            transport: Arc::new(transport),
            queue,
            poller: Poller::new(),
            connection,
        })
    }

    /// Queues a request. Non-idempotent requests are attempted once.
    pub fn submit(&self, request: RequestDescriptor, priority: i32) -> RequestHandle<Response> {
        tracing::debug!(method = %request.method, path = %request.path, priority, "submitting");
        let idempotent = request.idempotent;
        let transport = Arc::clone(&self.transport);
        let operation = move || {
            let transport = Arc::clone(&transport);
            let request = request.clone();
            async move { transport.execute(request).await }
        };

        if idempotent {
            self.queue.enqueue(operation, priority)
        } else {
            self.queue.enqueue_once(operation, priority)
        }
    }

    /// Polls `status_path` until the task it describes resolves.
    ///
    /// Returns the task id.
    pub fn track_task(
        &self,
        task_id: impl Into<String>,
        status_path: impl Into<String>,
        options: PollOptions<TaskStatus>,
    ) -> Result<String> {
        let transport = Arc::clone(&self.transport);
        let status_path = status_path.into();
        let check = move || {
            let transport = Arc::clone(&transport);
            let request = RequestDescriptor::get(status_path.clone());
            async move {
                transport
                    .execute(request)
                    .await
                    .and_then(|response| response.json::<TaskStatus>())
            }
        };
        Ok(self.poller.start(task_id, check, options)?)
    }

    /// Poll options seeded from the configured defaults.
    pub fn poll_options<R>(&self) -> PollOptions<R> {
        PollOptions::from_defaults(&self.config.poll)
    }

    /// Opens the persistent connection at the configured `socket_url`.
    pub fn connect(&self) -> Result<()> {
        let url = self.config.socket_url.clone().ok_or(Error::NoSocketUrl)?;
        self.connection.connect(url);
        Ok(())
    }

    /// Stops every poll, disconnects and cancels pending requests.
    ///
    /// In-flight requests still resolve.
    pub fn shutdown(&self) {
        self.poller.stop_all();
        self.connection.disconnect();
        let cancelled = self.queue.clear();
        tracing::debug!(cancelled, "client shut down");
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn connection(&self) -> &Connection<C> {
        &self.connection
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
