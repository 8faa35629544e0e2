// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent connection with automatic reconnection.
//!
//! Each `connect` starts a session: a background task that opens the channel,
//! pumps frames in both directions and, when the channel drops, reopens it
//! with exponential backoff. `disconnect` cancels the session, which also
//! cancels any pending reconnect timer.
//!
//! ```text
//! Disconnected ──connect──► Connecting ──open ok──► Connected
//!                              ▲                        │ close / error
//!                              │ backoff elapsed        ▼
//!                              └────────────────── Reconnecting
//! ```
//!
//! Once `max_reconnect_attempts` consecutive reopens have failed the session
//! ends in `Disconnected` without further events.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_core::{Backoff, Inbound, Outbound};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::channel::{ChannelPair, Connector, WebSocketConnector};
use crate::lock;

/// Reason reported when the caller disconnects.
pub const CLIENT_DISCONNECT: &str = "client disconnect";

/// Reason reported when the peer closes the channel.
pub const PEER_CLOSED: &str = "closed by peer";

/// Configuration for a [`Connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Reopen attempts after the channel drops (0 disables reconnection).
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Event kinds a listener can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    Error,
    /// Untyped JSON or raw text frames.
    Message,
    /// JSON frames whose `type` tag equals the given name.
    Typed(String),
}

/// An event emitted by a [`Connection`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected { reason: String },
    Error { message: String },
    /// A frame without a type tag: untyped JSON or raw text.
    Message(Inbound),
    /// A JSON frame with a type tag. `payload` is the whole object.
    Typed { kind: String, payload: Value },
}

impl ConnectionEvent {
    /// The kind listeners subscribe to for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ConnectionEvent::Connected => EventKind::Connected,
            ConnectionEvent::Disconnected { .. } => EventKind::Disconnected,
            ConnectionEvent::Error { .. } => EventKind::Error,
            ConnectionEvent::Message(_) => EventKind::Message,
            ConnectionEvent::Typed { kind, .. } => EventKind::Typed(kind.clone()),
        }
    }

    fn from_frame(text: &str) -> Self {
        match Inbound::parse(text) {
            Inbound::Typed { kind, payload } => ConnectionEvent::Typed { kind, payload },
            other => ConnectionEvent::Message(other),
        }
    }
}

/// Identifies a registered listener for [`Connection::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Arc<dyn Fn(&ConnectionEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, EventKind, Handler)>,
}

struct ConnState {
    url: Option<String>,
    phase: ConnectionState,
    attempts: u32,
    session: Option<CancellationToken>,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

struct Shared<C> {
    connector: C,
    config: ConnectionConfig,
    state: Mutex<ConnState>,
    listeners: Mutex<Listeners>,
}

/// A persistent duplex connection.
///
/// Cloning yields another handle to the same connection. Must be used from
/// within a tokio runtime.
pub struct Connection<C: Connector = WebSocketConnector> {
    shared: Arc<Shared<C>>,
}

impl<C: Connector> Clone for Connection<C> {
    fn clone(&self) -> Self {
        Connection {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Connector> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("url", &self.url())
            .finish_non_exhaustive()
    }
}

impl Connection<WebSocketConnector> {
    /// Creates a WebSocket connection.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(WebSocketConnector::new(), config)
    }
}

impl<C: Connector> Connection<C> {
    /// Creates a connection that opens channels through `connector`.
    pub fn with_connector(connector: C, config: ConnectionConfig) -> Self {
        Connection {
            shared: Arc::new(Shared {
                connector,
                config,
                state: Mutex::new(ConnState {
                    url: None,
                    phase: ConnectionState::Disconnected,
                    attempts: 0,
                    session: None,
                    outbound: None,
                }),
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Opens a channel to `url` in the background.
    ///
    /// An existing session is disconnected first.
    pub fn connect(&self, url: impl Into<String>) {
        let url = url.into();
        if self.state() != ConnectionState::Disconnected {
            self.disconnect();
        }

        let session = CancellationToken::new();
        {
            let mut state = lock(&self.shared.state);
            if let Some(previous) = state.session.replace(session.clone()) {
                previous.cancel();
            }
            state.url = Some(url.clone());
            state.phase = ConnectionState::Connecting;
            state.attempts = 0;
            state.outbound = None;
        }

        tracing::info!(url = %url, "connecting");
        tokio::spawn(Arc::clone(&self.shared).drive(url, session));
    }

    /// Closes the channel and suppresses reconnection.
    ///
    /// Registered listeners are kept.
    pub fn disconnect(&self) {
        let was_connected = {
            let mut state = lock(&self.shared.state);
            if let Some(session) = state.session.take() {
                session.cancel();
            }
            state.url = None;
            state.outbound = None;
            state.attempts = 0;
            let was_connected = state.phase == ConnectionState::Connected;
            state.phase = ConnectionState::Disconnected;
            was_connected
        };

        if was_connected {
            tracing::info!("disconnected by client");
            self.shared.emit(&ConnectionEvent::Disconnected {
                reason: CLIENT_DISCONNECT.to_string(),
            });
        }
    }

    /// Sends a payload. Returns false, sending nothing, unless connected.
    pub fn send(&self, payload: impl Into<Outbound>) -> bool {
        let state = lock(&self.shared.state);
        if state.phase != ConnectionState::Connected {
            return false;
        }
        match state.outbound {
            Some(ref tx) => tx.send(payload.into().into_wire()).is_ok(),
            None => false,
        }
    }

    /// Serializes `value` to JSON and sends it.
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.send(value),
            Err(e) => {
                tracing::warn!("failed to serialize outbound payload: {}", e);
                false
            }
        }
    }

    /// Registers a handler for events of `kind`.
    ///
    /// Handlers of the same kind run in registration order.
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&ConnectionEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let mut listeners = lock(&self.shared.listeners);
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, kind, Arc::new(handler)));
        id
    }

    /// Removes a handler. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.shared.listeners);
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _, _)| *entry != id);
        listeners.entries.len() != before
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.shared.state).phase
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Consecutive reopen attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        lock(&self.shared.state).attempts
    }

    /// Target of the current session, if any.
    pub fn url(&self) -> Option<String> {
        lock(&self.shared.state).url.clone()
    }
}

impl<C: Connector> Shared<C> {
    /// Calls the handlers registered for the event's kind.
    fn emit(&self, event: &ConnectionEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = lock(&self.listeners)
            .entries
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    /// Runs one session until it is cancelled or reconnection gives up.
    async fn drive(self: Arc<Self>, url: String, session: CancellationToken) {
        let backoff = Backoff::from_millis(self.config.reconnect_delay_ms);

        loop {
            let opened = tokio::select! {
                biased;
                _ = session.cancelled() => return,
                result = self.connector.open(&url) => result,
            };

            let reason = match opened {
                Ok(pair) => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    {
                        let mut state = lock(&self.state);
                        if session.is_cancelled() {
                            return;
                        }
                        state.phase = ConnectionState::Connected;
                        state.attempts = 0;
                        state.outbound = Some(tx);
                    }
                    tracing::info!(url = %url, "connected");
                    self.emit(&ConnectionEvent::Connected);

                    match self.pump(pair, rx, &session).await {
                        Some(reason) => reason,
                        None => return,
                    }
                }
                Err(e) => {
                    tracing::debug!(url = %url, "open failed: {}", e);
                    let message = e.to_string();
                    self.emit(&ConnectionEvent::Error {
                        message: message.clone(),
                    });
                    message
                }
            };

            // Decide before emitting so listeners observe the next state.
            let retry = {
                let mut state = lock(&self.state);
                if session.is_cancelled() {
                    return;
                }
                state.outbound = None;
                if state.url.is_some() && state.attempts < self.config.max_reconnect_attempts {
                    let delay = backoff.delay(state.attempts);
                    state.attempts += 1;
                    state.phase = ConnectionState::Reconnecting;
                    Some((delay, state.attempts))
                } else {
                    state.phase = ConnectionState::Disconnected;
                    state.session = None;
                    None
                }
            };

            tracing::info!(url = %url, reason = %reason, "channel closed");
            self.emit(&ConnectionEvent::Disconnected { reason });

            let Some((delay, attempt)) = retry else {
                tracing::warn!(
                    url = %url,
                    attempts = self.config.max_reconnect_attempts,
                    "giving up reconnecting"
                );
                return;
            };
            tracing::info!(url = %url, attempt, "reconnecting in {:?}", delay);

            tokio::select! {
                biased;
                _ = session.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            {
                let mut state = lock(&self.state);
                if session.is_cancelled() {
                    return;
                }
                state.phase = ConnectionState::Connecting;
            }
        }
    }

    /// Moves frames until the channel drops or the session is cancelled.
    ///
    /// Returns the close reason, or `None` when cancelled.
    async fn pump(
        &self,
        pair: ChannelPair,
        mut outbound: mpsc::UnboundedReceiver<String>,
        session: &CancellationToken,
    ) -> Option<String> {
        let ChannelPair {
            mut sink,
            mut stream,
        } = pair;

        loop {
            tokio::select! {
                biased;
                _ = session.cancelled() => {
                    if let Err(e) = sink.close().await {
                        tracing::debug!("close failed: {}", e);
                    }
                    return None;
                }
                Some(frame) = outbound.recv() => {
                    if let Err(e) = sink.send(frame).await {
                        let message = e.to_string();
                        self.emit(&ConnectionEvent::Error { message: message.clone() });
                        return Some(message);
                    }
                }
                received = stream.recv() => match received {
                    Ok(Some(text)) => self.emit(&ConnectionEvent::from_frame(&text)),
                    Ok(None) => return Some(PEER_CLOSED.to_string()),
                    Err(e) => {
                        let message = e.to_string();
                        self.emit(&ConnectionEvent::Error { message: message.clone() });
                        return Some(message);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
