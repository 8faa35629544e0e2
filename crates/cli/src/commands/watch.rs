// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::{json, Value};
use tether::{Client, ClientConfig, ConnectionEvent, ConnectionState, EventKind, Inbound};
use tokio::sync::mpsc;

use super::print_json_line;
use crate::error::{Error, Result};

/// Converts an event to its JSON line.
pub(crate) fn event_json(event: &ConnectionEvent) -> Value {
    match event {
        ConnectionEvent::Connected => json!({ "event": "connected" }),
        ConnectionEvent::Disconnected { reason } => {
            json!({ "event": "disconnected", "reason": reason })
        }
        ConnectionEvent::Error { message } => json!({ "event": "error", "message": message }),
        ConnectionEvent::Message(Inbound::Untyped(value)) => {
            json!({ "event": "message", "data": value })
        }
        ConnectionEvent::Message(Inbound::Raw(text)) => json!({ "event": "message", "data": text }),
        ConnectionEvent::Typed { kind, payload }
        | ConnectionEvent::Message(Inbound::Typed { kind, payload }) => {
            json!({ "event": kind, "data": payload })
        }
    }
}

/// Kinds `watch` subscribes to.
pub(crate) fn subscriptions(types: &[String]) -> Vec<EventKind> {
    let mut kinds = vec![
        EventKind::Connected,
        EventKind::Disconnected,
        EventKind::Error,
        EventKind::Message,
    ];
    kinds.extend(types.iter().cloned().map(EventKind::Typed));
    kinds
}

/// Prints connection events until interrupted or reconnection gives up.
pub async fn run(config: ClientConfig, types: &[String]) -> Result<()> {
    let client = Client::new(config)?;
    let connection = client.connection();

    let (tx, mut rx) = mpsc::unbounded_channel();
    for kind in subscriptions(types) {
        let tx = tx.clone();
        connection.on(kind, move |event| {
            let _ = tx.send(event.clone());
        });
    }
    drop(tx);

    client.connect()?;

    loop {
        tokio::select! {
            biased;
            Some(event) = rx.recv() => {
                print_json_line(&event_json(&event))?;
                if is_final(&event, connection.state()) {
                    while let Ok(event) = rx.try_recv() {
                        print_json_line(&event_json(&event))?;
                    }
                    let url = client.config().socket_url.clone().unwrap_or_default();
                    return Err(Error::ConnectionLost(url));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                client.shutdown();
                return Ok(());
            }
        }
    }
}

/// True once reconnection has given up.
///
/// The connection settles its next state before emitting `Disconnected`, so
/// a `Disconnected` seen while the state is `Disconnected` is the last one.
pub(crate) fn is_final(event: &ConnectionEvent, state: ConnectionState) -> bool {
    matches!(event, ConnectionEvent::Disconnected { .. }) && state == ConnectionState::Disconnected
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
