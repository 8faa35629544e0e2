// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Polling of long-running remote tasks.
//!
//! Each task id owns at most one background loop. The loop runs the check
//! immediately, then once per interval, and never has two checks for the
//! same id outstanding. Each result is interpreted through [`PollStatus`]:
//!
//! ```text
//! completed?  ──► Completed  (on_complete)
//! failed?     ──► Failed     (on_error)
//! otherwise   ──► on_progress, then TimedOut once attempts reach max_attempts
//! ```
//!
//! A check that returns an error is logged and the loop continues; only
//! terminal results and attempt exhaustion end a poll. An erroring check
//! still uses up an attempt, so a poll whose checks keep failing times out.
//!
//! A loop that exits any other way, including a panicking callback, drops
//! its entry so the task id no longer reports as polling.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tether_core::{ErrorKind, PollStatus};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::lock;

/// Message used when a failed result carries none.
pub const GENERIC_FAILURE: &str = "task failed";

/// Default polling parameters, as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDefaults {
    /// Delay between checks in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Checks before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    300
}

impl Default for PollDefaults {
    fn default() -> Self {
        PollDefaults {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollDefaults {
    /// Checks option values.
    pub fn validate(&self) -> tether_core::Result<()> {
        validate(Duration::from_millis(self.interval_ms), self.max_attempts)
    }
}

fn validate(interval: Duration, max_attempts: u32) -> tether_core::Result<()> {
    if interval.is_zero() {
        return Err(tether_core::Error::invalid_config(
            "poll.interval_ms",
            "must be greater than 0",
        ));
    }
    if max_attempts == 0 {
        return Err(tether_core::Error::invalid_config(
            "poll.max_attempts",
            "must be at least 1",
        ));
    }
    Ok(())
}

/// Terminal error reported to a poll's `on_error` callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// The remote reported the task as failed.
    #[error("task {task_id} failed: {message}")]
    Failed { task_id: String, message: String },

    /// The task was still in progress after the last allowed check.
    #[error("task {task_id} timed out after {attempts} attempts")]
    TimedOut { task_id: String, attempts: u32 },
}

impl PollError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Terminal
    }
}

type ResultCallback<R> = Arc<dyn Fn(R) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(PollError) + Send + Sync>;

/// Options for a single poll.
pub struct PollOptions<R> {
    pub interval: Duration,
    pub max_attempts: u32,
    on_progress: Option<ResultCallback<R>>,
    on_complete: Option<ResultCallback<R>>,
    on_error: Option<ErrorCallback>,
}

impl<R> Default for PollOptions<R> {
    fn default() -> Self {
        Self::from_defaults(&PollDefaults::default())
    }
}

impl<R> Clone for PollOptions<R> {
    fn clone(&self) -> Self {
        PollOptions {
            interval: self.interval,
            max_attempts: self.max_attempts,
            on_progress: self.on_progress.clone(),
            on_complete: self.on_complete.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<R> fmt::Debug for PollOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl<R> PollOptions<R> {
    /// Creates options with default values and no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options seeded from configuration.
    pub fn from_defaults(defaults: &PollDefaults) -> Self {
        PollOptions {
            interval: Duration::from_millis(defaults.interval_ms),
            max_attempts: defaults.max_attempts,
            on_progress: None,
            on_complete: None,
            on_error: None,
        }
    }

    /// Set the delay between checks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum number of checks.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Called with every in-progress result.
    pub fn on_progress(mut self, f: impl Fn(R) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// Called once with the completed result.
    pub fn on_complete(mut self, f: impl Fn(R) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }

    /// Called once on failure or timeout.
    pub fn on_error(mut self, f: impl Fn(PollError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

/// Lifecycle of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Active,
    Completed,
    Failed,
    TimedOut,
    Stopped,
}

/// Snapshot of a tracked task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollTask {
    pub task_id: String,
    pub interval: Duration,
    pub max_attempts: u32,
    /// Checks issued so far.
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub state: PollState,
}

struct PollEntry {
    generation: u64,
    cancel: CancellationToken,
    task: PollTask,
}

/// Removes a loop's entry when the loop ends, unless it was replaced.
struct LoopGuard {
    poller: Poller,
    task_id: String,
    generation: u64,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        let mut tasks = lock(&self.poller.tasks);
        if tasks
            .get(&self.task_id)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            tasks.remove(&self.task_id);
        }
    }
}

/// Tracks long-running remote tasks until they resolve.
///
/// Cloning yields another handle to the same set of tasks. Must be used
/// from within a tokio runtime.
#[derive(Clone, Default)]
pub struct Poller {
    tasks: Arc<Mutex<HashMap<String, PollEntry>>>,
    generations: Arc<AtomicU64>,
}

impl Poller {
    /// Creates a poller with no tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts polling `task_id`, replacing any poll already running for it.
    ///
    /// Returns the task id.
    pub fn start<R, E, F, Fut>(
        &self,
        task_id: impl Into<String>,
        check: F,
        options: PollOptions<R>,
    ) -> tether_core::Result<String>
    where
        R: PollStatus + Send + 'static,
        E: fmt::Display + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        validate(options.interval, options.max_attempts)?;

        let task_id = task_id.into();
        let generation = self.generations.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let entry = PollEntry {
            generation,
            cancel: cancel.clone(),
            task: PollTask {
                task_id: task_id.clone(),
                interval: options.interval,
                max_attempts: options.max_attempts,
                attempts: 0,
                started_at: Utc::now(),
                state: PollState::Active,
            },
        };

        if let Some(previous) = lock(&self.tasks).insert(task_id.clone(), entry) {
            tracing::debug!(task_id = %task_id, "replacing existing poll");
            previous.cancel.cancel();
        }

        tracing::debug!(
            task_id = %task_id,
            interval = ?options.interval,
            max_attempts = options.max_attempts,
            "poll started"
        );
        let poller = self.clone();
        tokio::spawn(poller.run(task_id.clone(), generation, cancel, check, options));
        Ok(task_id)
    }

    /// Stops polling `task_id` without invoking any callback.
    ///
    /// Returns false if the task was not being polled.
    pub fn stop(&self, task_id: &str) -> bool {
        match lock(&self.tasks).remove(task_id) {
            Some(entry) => {
                entry.cancel.cancel();
                tracing::debug!(task_id, state = ?PollState::Stopped, "poll stopped");
                true
            }
            None => false,
        }
    }

    /// Stops every tracked task.
    pub fn stop_all(&self) {
        let entries: Vec<PollEntry> = lock(&self.tasks).drain().map(|(_, e)| e).collect();
        for entry in entries {
            entry.cancel.cancel();
        }
    }

    /// Returns true while `task_id` is being polled.
    pub fn is_polling(&self, task_id: &str) -> bool {
        lock(&self.tasks).contains_key(task_id)
    }

    /// Returns a snapshot of `task_id`, if it is being polled.
    pub fn status(&self, task_id: &str) -> Option<PollTask> {
        lock(&self.tasks).get(task_id).map(|e| e.task.clone())
    }

    /// Ids of every task being polled.
    pub fn active_tasks(&self) -> Vec<String> {
        lock(&self.tasks).keys().cloned().collect()
    }

    /// Counts a check for the current poll of `task_id`.
    ///
    /// Returns `None` if that poll was stopped or replaced.
    fn record_attempt(&self, task_id: &str, generation: u64) -> Option<u32> {
        let mut tasks = lock(&self.tasks);
        let entry = tasks.get_mut(task_id)?;
        if entry.generation != generation {
            return None;
        }
        entry.task.attempts += 1;
        Some(entry.task.attempts)
    }

    /// Removes the current poll of `task_id` on reaching a terminal state.
    ///
    /// Returns false if it was stopped or replaced in the meantime, in which
    /// case the caller must not invoke callbacks.
    fn finish(&self, task_id: &str, generation: u64, state: PollState) -> bool {
        let mut tasks = lock(&self.tasks);
        match tasks.get(task_id) {
            Some(entry) if entry.generation == generation => {
                tasks.remove(task_id);
                tracing::debug!(task_id, ?state, "poll finished");
                true
            }
            _ => false,
        }
    }

    async fn run<R, E, F, Fut>(
        self,
        task_id: String,
        generation: u64,
        cancel: CancellationToken,
        check: F,
        options: PollOptions<R>,
    ) where
        R: PollStatus + Send + 'static,
        E: fmt::Display + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let _guard = LoopGuard {
            poller: self.clone(),
            task_id: task_id.clone(),
            generation,
        };
        let mut ticker = tokio::time::interval(options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let Some(attempts) = self.record_attempt(&task_id, generation) else {
                return;
            };

            let outcome = check().await;
            if cancel.is_cancelled() {
                tracing::debug!(task_id = %task_id, "discarding result of stopped poll");
                return;
            }

            match outcome {
                Ok(result) if result.is_completed() => {
                    if self.finish(&task_id, generation, PollState::Completed) {
                        if let Some(ref on_complete) = options.on_complete {
                            on_complete(result);
                        }
                    }
                    return;
                }
                Ok(result) if result.is_failed() => {
                    let message = result
                        .failure_message()
                        .unwrap_or(GENERIC_FAILURE)
                        .to_string();
                    if self.finish(&task_id, generation, PollState::Failed) {
                        if let Some(ref on_error) = options.on_error {
                            on_error(PollError::Failed {
                                task_id: task_id.clone(),
                                message,
                            });
                        }
                    }
                    return;
                }
                Ok(result) => {
                    if let Some(ref on_progress) = options.on_progress {
                        on_progress(result);
                    }
                }
                Err(e) => {
                    tracing::warn!(task_id = %task_id, attempt = attempts, "status check failed: {}", e);
                }
            }

            if attempts >= options.max_attempts {
                if self.finish(&task_id, generation, PollState::TimedOut) {
                    tracing::warn!(task_id = %task_id, attempts, "poll timed out");
                    if let Some(ref on_error) = options.on_error {
                        on_error(PollError::TimedOut {
                            task_id: task_id.clone(),
                            attempts,
                        });
                    }
                }
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
