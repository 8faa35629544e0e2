// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tether watch` against a WebSocket peer.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

#[path = "common.rs"]
mod common;

use std::time::Duration;

use common::*;
use serde_json::{json, Value};

const NO_RECONNECT: &str = "[connection]\nmax_reconnect_attempts = 0\n";

const FRAMES: [&str; 3] = [
    r#"{"type":"progress","pct":40}"#,
    r#"{"hello":1}"#,
    r#"{"type":"ignored"}"#,
];

/// Runs `tether watch` until the peer hangs up and returns the stdout lines.
fn watch(extra: &[&str]) -> Vec<Value> {
    let peer = SocketPeer::start(FRAMES.to_vec());
    let env = Env::new();
    let config = env.write_config(NO_RECONNECT);

    let assert = env
        .tether()
        .args(["watch", "--socket-url", &peer.url])
        .arg("--config")
        .arg(&config)
        .args(extra)
        .timeout(Duration::from_secs(20))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "connection to {} lost",
            peer.url
        )));

    String::from_utf8(assert.get_output().stdout.clone())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn prints_subscribed_events_then_fails_when_peer_is_gone() {
    let lines = watch(&["--type", "progress"]);

    assert_eq!(lines[0], json!({"event": "connected"}));
    assert_eq!(
        lines[1],
        json!({"event": "progress", "data": {"type": "progress", "pct": 40}})
    );
    assert_eq!(lines[2], json!({"event": "message", "data": {"hello": 1}}));
    assert_eq!(lines.last().unwrap()["event"], "disconnected");
    assert!(lines.iter().all(|l| l["event"] != "ignored"));
}

#[test]
fn typed_events_need_a_subscription() {
    let lines = watch(&[]);

    assert_eq!(lines[0], json!({"event": "connected"}));
    assert_eq!(lines[1], json!({"event": "message", "data": {"hello": 1}}));
    assert!(lines
        .iter()
        .all(|l| l["event"] != "progress" && l["event"] != "ignored"));
    assert_eq!(lines.last().unwrap()["event"], "disconnected");
}
