// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tether poll` against a mock HTTP service.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

#[path = "common.rs"]
mod common;

use common::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn status(body: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path("/tasks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

fn poll(env: &Env, server: &StubServer, extra: &[&str]) -> assert_cmd::assert::Assert {
    env.tether()
        .args(["poll", "t1", "--status-path", "/tasks/t1", "--interval-ms", "10"])
        .args(["--base-url", &server.url()])
        .args(extra)
        .assert()
}

#[test]
fn prints_each_status_until_complete() {
    let server = StubServer::start();
    server
        .mount(status(json!({"state": "queued"})).up_to_n_times(1))
        .mount(status(json!({"state": "running"})).up_to_n_times(1))
        .mount(status(json!({"completed": true, "result": 42})));
    let env = Env::new();

    let output = poll(&env, &server, &[]).success().get_output().stdout.clone();
    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["state"], "queued");
    assert_eq!(lines[1]["state"], "running");
    assert_eq!(lines[2]["completed"], true);
    assert_eq!(lines[2]["result"], 42);
    assert_eq!(server.requests().len(), 3);
}

#[test]
fn failed_task_reports_message() {
    let server = StubServer::start();
    server.mount(status(json!({"failed": true, "error": "boom"})));

    poll(&Env::new(), &server, &[])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("task t1 failed: boom"));
}

#[test]
fn failed_task_without_message() {
    let server = StubServer::start();
    server.mount(status(json!({"failed": true})));

    poll(&Env::new(), &server, &[])
        .failure()
        .stderr(predicate::str::contains("task t1 failed: task failed"));
}

#[test]
fn gives_up_after_max_attempts() {
    let server = StubServer::start();
    server.mount(status(json!({"state": "queued"})));

    poll(&Env::new(), &server, &["--max-attempts", "2"])
        .failure()
        .stderr(predicate::str::contains("task t1 timed out after 2 attempts"));
}

#[test]
fn check_errors_count_as_attempts() {
    let server = StubServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/tasks/t1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops")),
    );

    poll(&Env::new(), &server, &["--max-attempts", "3"])
        .failure()
        .stderr(predicate::str::contains("timed out after 3 attempts"));
}
