// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Duplex text channels for the persistent connection.
//!
//! Provides a trait-based channel layer that enables:
//! - Real WebSocket connections for production
//! - Mock connectors for unit testing
//!
//! An opened channel is split into a sink and a stream so that the
//! connection can write while it waits for the next inbound frame.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for channel operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Writing half of an open channel.
pub trait ChannelSink: Send {
    /// Sends one text frame.
    fn send(&mut self, text: String) -> Pin<Box<dyn Future<Output = ChannelResult<()>> + Send + '_>>;

    /// Closes the channel.
    fn close(&mut self) -> Pin<Box<dyn Future<Output = ChannelResult<()>> + Send + '_>>;
}

/// Reading half of an open channel.
pub trait ChannelStream: Send {
    /// Receives the next text frame.
    ///
    /// Returns `None` once the peer has closed the channel.
    fn recv(&mut self)
        -> Pin<Box<dyn Future<Output = ChannelResult<Option<String>>> + Send + '_>>;
}

/// Both halves of an open channel.
pub struct ChannelPair {
    pub sink: Box<dyn ChannelSink>,
    pub stream: Box<dyn ChannelStream>,
}

/// Opens channels to a URL.
pub trait Connector: Send + Sync + 'static {
    /// Opens a channel to `url`.
    fn open(&self, url: &str) -> Pin<Box<dyn Future<Output = ChannelResult<ChannelPair>> + Send + '_>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connector implementation using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        WebSocketConnector
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, url: &str) -> Pin<Box<dyn Future<Output = ChannelResult<ChannelPair>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws.split();
            Ok(ChannelPair {
                sink: Box::new(WebSocketSink { sink }),
                stream: Box::new(WebSocketReader { stream }),
            })
        })
    }
}

struct WebSocketSink {
    sink: SplitSink<WsStream, Message>,
}

impl ChannelSink for WebSocketSink {
    fn send(&mut self, text: String) -> Pin<Box<dyn Future<Output = ChannelResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.sink
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

            // Flush so a broken connection is detected at send time
            self.sink
                .flush()
                .await
                .map_err(|e| ChannelError::SendFailed(e.to_string()))
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = ChannelResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.sink
                .close()
                .await
                .map_err(|e| ChannelError::SendFailed(e.to_string()))
        })
    }
}

struct WebSocketReader {
    stream: SplitStream<WsStream>,
}

impl ChannelStream for WebSocketReader {
    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = ChannelResult<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => {
                            tracing::debug!(len = bytes.len(), "skipping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(None),
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(ChannelError::ReceiveFailed(e.to_string())),
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
