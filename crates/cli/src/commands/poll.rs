// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tether::{Client, ClientConfig, PollError, PollOptions, TaskStatus};
use tokio::sync::mpsc;

use super::print_json_line;
use crate::error::{Error, Result};

enum Update {
    Progress(TaskStatus),
    Complete(TaskStatus),
    Failed(PollError),
}

/// Builds poll options from the configured defaults and any overrides.
pub(crate) fn options(
    client: &Client,
    interval_ms: Option<u64>,
    max_attempts: Option<u32>,
) -> PollOptions<TaskStatus> {
    let mut options = client.poll_options();
    if let Some(ms) = interval_ms {
        options = options.with_interval(Duration::from_millis(ms));
    }
    if let Some(n) = max_attempts {
        options = options.with_max_attempts(n);
    }
    options
}

/// Polls a task, printing each result as a JSON line.
pub async fn run(
    config: ClientConfig,
    task_id: &str,
    status_path: &str,
    interval_ms: Option<u64>,
    max_attempts: Option<u32>,
) -> Result<()> {
    let client = Client::new(config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (progress, complete, failed) = (tx.clone(), tx.clone(), tx);

    let options = options(&client, interval_ms, max_attempts)
        .on_progress(move |status| {
            let _ = progress.send(Update::Progress(status));
        })
        .on_complete(move |status| {
            let _ = complete.send(Update::Complete(status));
        })
        .on_error(move |e| {
            let _ = failed.send(Update::Failed(e));
        });

    client.track_task(task_id, status_path, options)?;

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Some(Update::Progress(status)) => print_json_line(&status)?,
                Some(Update::Complete(status)) => {
                    print_json_line(&status)?;
                    return Ok(());
                }
                Some(Update::Failed(e)) => return Err(e.into()),
                None => return Err(Error::Interrupted),
            },
            _ = tokio::signal::ctrl_c() => {
                client.shutdown();
                return Err(Error::Interrupted);
            }
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
