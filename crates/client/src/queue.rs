// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Priority request queue with bounded concurrency and retry.
//!
//! Requests are kept in `pending` sorted by descending priority, FIFO among
//! equal priorities. A dispatch step runs on every state change (enqueue,
//! settle, resume) and starts requests until the concurrency limit is reached.
//!
//! A request that fails with a transient error is retried after
//! `retry_delay * 2^(attempts - 1)`. Once its backoff elapses it re-enters
//! `pending` at the front, ahead of fresh work of any priority that is
//! already waiting.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tether_core::{Backoff, ErrorKind, RequestError};
use tokio::sync::oneshot;

use crate::lock;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Cause reported when an operation panics.
pub const OPERATION_PANICKED: &str = "operation panicked";

/// Configuration for a [`RequestQueue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of requests in flight.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Maximum number of invocations per request, the first included.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_concurrent() -> usize {
    5
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            max_concurrent: default_max_concurrent(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl QueueConfig {
    /// Checks option values.
    pub fn validate(&self) -> tether_core::Result<()> {
        if self.max_concurrent == 0 {
            return Err(tether_core::Error::invalid_config(
                "queue.max_concurrent",
                "must be at least 1",
            ));
        }
        if self.retry_attempts == 0 {
            return Err(tether_core::Error::invalid_config(
                "queue.retry_attempts",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Backoff schedule for retries.
    pub fn backoff(&self) -> Backoff {
        Backoff::from_millis(self.retry_delay_ms)
    }
}

/// Error delivered to the submitter of a queued request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The request was removed by [`RequestQueue::clear`] before it started.
    #[error("request cancelled")]
    Cancelled,

    /// The request failed terminally or exhausted its attempts.
    #[error("request failed after {attempts} attempt(s): {source}")]
    Failed {
        attempts: u32,
        source: RequestError,
    },
}

impl QueueError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Cancelled => ErrorKind::Cancelled,
            QueueError::Failed { .. } => ErrorKind::Terminal,
        }
    }

    /// The last error reported by the operation, if it ran.
    pub fn cause(&self) -> Option<&RequestError> {
        match self {
            QueueError::Cancelled => None,
            QueueError::Failed { source, .. } => Some(source),
        }
    }
}

/// Point-in-time snapshot of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Requests waiting to start.
    pub pending: usize,
    /// Requests in flight.
    pub running: usize,
    /// Requests waiting out a retry backoff.
    pub retrying: usize,
    pub paused: bool,
}

/// Type-erased unit of work owned by the queue.
trait Job: Send + Sync {
    /// Invokes the operation once. On success the submitter is resolved.
    fn attempt(self: Arc<Self>) -> BoxFuture<Result<(), RequestError>>;

    /// Resolves the submitter with an error.
    fn reject(&self, error: QueueError);
}

struct TypedJob<T, F> {
    operation: F,
    reply: Mutex<Option<oneshot::Sender<Result<T, QueueError>>>>,
}

impl<T, F> TypedJob<T, F> {
    fn resolve(&self, outcome: Result<T, QueueError>) {
        // take() guarantees the submitter is resolved at most once
        if let Some(tx) = lock(&self.reply).take() {
            let _ = tx.send(outcome);
        }
    }
}

impl<T, F, Fut> Job for TypedJob<T, F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
{
    fn attempt(self: Arc<Self>) -> BoxFuture<Result<(), RequestError>> {
        Box::pin(async move {
            let value = (self.operation)().await?;
            self.resolve(Ok(value));
            Ok(())
        })
    }

    fn reject(&self, error: QueueError) {
        self.resolve(Err(error));
    }
}

struct QueuedRequest {
    id: u64,
    priority: i32,
    attempts: u32,
    max_attempts: u32,
    job: Arc<dyn Job>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedRequest>,
    running: usize,
    retrying: usize,
    paused: bool,
    next_id: u64,
}

struct Shared {
    config: QueueConfig,
    state: Mutex<QueueState>,
}

/// Future resolving to the outcome of a queued request.
///
/// Dropping the handle does not withdraw the request.
pub struct RequestHandle<T> {
    rx: oneshot::Receiver<Result<T, QueueError>>,
}

impl<T> Future for RequestHandle<T> {
    type Output = Result<T, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(QueueError::Cancelled)))
    }
}

/// Concurrency-bounded, priority-ordered request queue.
///
/// Cloning yields another handle to the same queue. Must be used from
/// within a tokio runtime.
#[derive(Clone)]
pub struct RequestQueue {
    shared: Arc<Shared>,
}

impl RequestQueue {
    /// Creates a queue, validating the configuration.
    pub fn new(config: QueueConfig) -> tether_core::Result<Self> {
        config.validate()?;
        Ok(RequestQueue {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(QueueState::default()),
            }),
        })
    }

    /// The queue's configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Submits an operation. Higher priorities start first.
    ///
    /// Transient failures are retried up to `retry_attempts` invocations in
    /// total; terminal failures are reported immediately.
    pub fn enqueue<T, F, Fut>(&self, operation: F, priority: i32) -> RequestHandle<T>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        self.push(operation, priority, self.shared.config.retry_attempts)
    }

    /// Submits an operation that is invoked at most once.
    pub fn enqueue_once<T, F, Fut>(&self, operation: F, priority: i32) -> RequestHandle<T>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        self.push(operation, priority, 1)
    }

    fn push<T, F, Fut>(&self, operation: F, priority: i32, max_attempts: u32) -> RequestHandle<T>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = Arc::new(TypedJob {
            operation,
            reply: Mutex::new(Some(tx)),
        });

        {
            let mut state = lock(&self.shared.state);
            let id = state.next_id;
            state.next_id += 1;
            state.pending.push_back(QueuedRequest {
                id,
                priority,
                attempts: 0,
                max_attempts,
                job,
            });
            // Stable sort: FIFO among equal priorities, retried requests keep
            // their place ahead of equal-priority newcomers.
            state
                .pending
                .make_contiguous()
                .sort_by(|a, b| b.priority.cmp(&a.priority));
            tracing::debug!(id, priority, pending = state.pending.len(), "request enqueued");
        }

        self.shared.schedule();
        RequestHandle { rx }
    }

    /// Stops dispatching new requests. In-flight requests continue.
    pub fn pause(&self) {
        lock(&self.shared.state).paused = true;
    }

    /// Resumes dispatching.
    pub fn resume(&self) {
        lock(&self.shared.state).paused = false;
        self.shared.schedule();
    }

    /// Rejects every pending request with [`QueueError::Cancelled`].
    ///
    /// In-flight requests and requests waiting out a backoff are unaffected.
    /// Returns the number of requests cancelled.
    pub fn clear(&self) -> usize {
        let drained: Vec<QueuedRequest> = lock(&self.shared.state).pending.drain(..).collect();
        let count = drained.len();
        for request in drained {
            request.job.reject(QueueError::Cancelled);
        }
        if count > 0 {
            tracing::debug!(count, "pending requests cancelled");
        }
        count
    }

    /// Returns a snapshot of the queue.
    pub fn status(&self) -> QueueStatus {
        let state = lock(&self.shared.state);
        QueueStatus {
            pending: state.pending.len(),
            running: state.running,
            retrying: state.retrying,
            paused: state.paused,
        }
    }
}

impl Shared {
    /// Starts pending requests while slots are free.
    fn schedule(self: &Arc<Self>) {
        loop {
            let request = {
                let mut state = lock(&self.state);
                if state.paused || state.running >= self.config.max_concurrent {
                    return;
                }
                match state.pending.pop_front() {
                    Some(request) => {
                        state.running += 1;
                        request
                    }
                    None => return,
                }
            };

            tracing::debug!(
                id = request.id,
                priority = request.priority,
                attempt = request.attempts + 1,
                "dispatching request"
            );
            let shared = Arc::clone(self);
            tokio::spawn(shared.run(request));
        }
    }

    async fn run(self: Arc<Self>, mut request: QueuedRequest) {
        // A panicking operation fails its request without leaking the slot
        let outcome = AssertUnwindSafe(Arc::clone(&request.job).attempt())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(RequestError::Rejected(OPERATION_PANICKED.to_string())));
        request.attempts += 1;

        match outcome {
            Ok(()) => self.settle(),
            Err(error) if error.is_transient() && request.attempts < request.max_attempts => {
                let delay = self.config.backoff().delay(request.attempts - 1);
                tracing::warn!(
                    id = request.id,
                    attempt = request.attempts,
                    max_attempts = request.max_attempts,
                    "request failed: {}. Retrying in {:?}",
                    error,
                    delay
                );
                {
                    let mut state = lock(&self.state);
                    state.running -= 1;
                    state.retrying += 1;
                }
                self.schedule();

                tokio::time::sleep(delay).await;

                {
                    let mut state = lock(&self.state);
                    state.retrying -= 1;
                    state.pending.push_front(request);
                }
                self.schedule();
            }
            Err(error) => {
                if error.is_transient() {
                    tracing::warn!(
                        id = request.id,
                        "all {} attempts exhausted. Last error: {}",
                        request.attempts,
                        error
                    );
                } else {
                    tracing::debug!(id = request.id, "request rejected: {}", error);
                }
                request.job.reject(QueueError::Failed {
                    attempts: request.attempts,
                    source: error,
                });
                self.settle();
            }
        }
    }

    /// Frees a slot and dispatches the next request.
    fn settle(self: &Arc<Self>) {
        {
            let mut state = lock(&self.state);
            state.running -= 1;
        }
        self.schedule();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
