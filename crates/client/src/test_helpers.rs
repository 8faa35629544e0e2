// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mock transport and connector shared by the client tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tether_core::RequestError;
use tokio::sync::mpsc;

use crate::channel::{
    ChannelError, ChannelPair, ChannelResult, ChannelSink, ChannelStream, Connector,
};
use crate::transport::{RequestDescriptor, Response, Transport, TransportResult};

/// Transport answering from per-path scripts.
///
/// Each path has a queue of answers; the last one repeats. Unscripted paths
/// answer with a 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    scripts: Arc<Mutex<HashMap<String, VecDeque<TransportResult<Response>>>>>,
    requests: Arc<Mutex<Vec<RequestDescriptor>>>,
    latency: Arc<Mutex<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an answer for `path`.
    pub fn respond(&self, path: &str, answer: TransportResult<Response>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(answer);
        self
    }

    /// Appends a 200 answer with the given body.
    pub fn respond_ok(&self, path: &str, body: serde_json::Value) -> &Self {
        self.respond(path, Ok(Response::new(200, body)))
    }

    /// Delays every answer.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Every request executed so far.
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests executed for `path`.
    pub fn calls(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    fn next_answer(&self, path: &str) -> TransportResult<Response> {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(path) {
            Some(answers) if answers.len() > 1 => answers.pop_front().unwrap(),
            Some(answers) if !answers.is_empty() => answers[0].clone(),
            _ => Err(RequestError::http(404, format!("no route for {}", path))),
        }
    }
}

impl Transport for MockTransport {
    fn execute(
        &self,
        request: RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Response>> + Send + '_>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            let latency = *self.latency.lock().unwrap();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            self.next_answer(&request.path)
        })
    }
}

/// Remote end of a channel opened through [`MockConnector`].
pub struct MockPeer {
    incoming: Mutex<Option<mpsc::UnboundedSender<ChannelResult<String>>>>,
    sent: Arc<Mutex<Vec<String>>>,
    closed_by_client: Arc<AtomicBool>,
}

impl MockPeer {
    /// Delivers a text frame to the client.
    pub fn push(&self, text: &str) {
        if let Some(tx) = self.incoming.lock().unwrap().as_ref() {
            let _ = tx.send(Ok(text.to_string()));
        }
    }

    /// Makes the client's next receive fail.
    pub fn push_error(&self, message: &str) {
        if let Some(tx) = self.incoming.lock().unwrap().as_ref() {
            let _ = tx.send(Err(ChannelError::ReceiveFailed(message.to_string())));
        }
    }

    /// Closes the channel from the remote side.
    pub fn hang_up(&self) {
        self.incoming.lock().unwrap().take();
    }

    /// Frames the client has sent.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Whether the client closed its sink.
    pub fn closed_by_client(&self) -> bool {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct ConnectorState {
    urls: Vec<String>,
    failing: bool,
    peers: Vec<Arc<MockPeer>>,
}

/// Connector producing in-memory channels.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector whose opens fail.
    pub fn failing() -> Self {
        let connector = Self::default();
        connector.set_failing(true);
        connector
    }

    /// Makes subsequent opens fail or succeed.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// Number of open attempts so far.
    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().urls.len()
    }

    /// URLs of every open attempt.
    pub fn urls(&self) -> Vec<String> {
        self.state.lock().unwrap().urls.clone()
    }

    /// Peer of the most recent successful open.
    pub fn last_peer(&self) -> Arc<MockPeer> {
        Arc::clone(self.state.lock().unwrap().peers.last().unwrap())
    }

    /// Number of successful opens.
    pub fn peers(&self) -> usize {
        self.state.lock().unwrap().peers.len()
    }
}

impl Connector for MockConnector {
    fn open(
        &self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = ChannelResult<ChannelPair>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.urls.push(url.clone());
            if state.failing {
                return Err(ChannelError::ConnectionFailed(format!(
                    "connection refused: {}",
                    url
                )));
            }

            let (tx, rx) = mpsc::unbounded_channel();
            let sent = Arc::new(Mutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            state.peers.push(Arc::new(MockPeer {
                incoming: Mutex::new(Some(tx)),
                sent: Arc::clone(&sent),
                closed_by_client: Arc::clone(&closed),
            }));

            Ok(ChannelPair {
                sink: Box::new(MockSink { sent, closed }),
                stream: Box::new(MockStream { rx }),
            })
        })
    }
}

struct MockSink {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl ChannelSink for MockSink {
    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = ChannelResult<()>> + Send + '_>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(ChannelError::ConnectionClosed);
            }
            self.sent.lock().unwrap().push(text);
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = ChannelResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<ChannelResult<String>>,
}

impl ChannelStream for MockStream {
    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = ChannelResult<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            match self.rx.recv().await {
                Some(Ok(text)) => Ok(Some(text)),
                Some(Err(e)) => Err(e),
                None => Ok(None),
            }
        })
    }
}
