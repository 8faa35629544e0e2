// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tether config` and configuration resolution.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

#[path = "common.rs"]
mod common;

use common::*;

#[test]
fn defaults_without_config_file() {
    Env::new()
        .tether()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#"base_url = ["']http://localhost:8080["']"#).unwrap())
        .stdout(predicate::str::contains("request_timeout_ms = 30000"))
        .stdout(predicate::str::contains("[queue]"))
        .stdout(predicate::str::contains("max_concurrent = 5"))
        .stdout(predicate::str::contains("[poll]"))
        .stdout(predicate::str::contains("interval_ms = 2000"))
        .stdout(predicate::str::contains("[connection]"))
        .stdout(predicate::str::contains("max_reconnect_attempts = 5"))
        .stdout(predicate::str::contains("socket_url").not());
}

#[test]
fn default_location_is_read() {
    let env = Env::new();
    let dir = env.home.path().join("tether");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[queue]\nmax_concurrent = 9\n").unwrap();

    env.tether()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_concurrent = 9"));
}

#[test]
fn explicit_file_and_flag_override() {
    let env = Env::new();
    let path = env.write_config(
        "base_url = \"https://file.test\"\nsocket_url = \"wss://file.test/ws\"\n",
    );

    env.tether()
        .arg("config")
        .arg("--config")
        .arg(&path)
        .arg("--base-url")
        .arg("https://flag.test")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#"base_url = ["']https://flag\.test["']"#).unwrap())
        .stdout(predicate::str::is_match(r#"socket_url = ["']wss://file\.test/ws["']"#).unwrap());
}

#[test]
fn environment_overrides_file() {
    let env = Env::new();
    let path = env.write_config("base_url = \"https://file.test\"\n");

    env.tether()
        .env("TETHER_CONFIG", &path)
        .env("TETHER_BASE_URL", "https://env.test")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#"base_url = ["']https://env\.test["']"#).unwrap());
}

#[test]
fn missing_explicit_file_fails() {
    let env = Env::new();
    env.tether()
        .arg("config")
        .arg("--config")
        .arg(env.home.path().join("absent.toml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("error: config file not found"));
}

#[test]
fn invalid_value_fails_validation() {
    let env = Env::new();
    let path = env.write_config("[queue]\nmax_concurrent = 0\n");

    env.tether()
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("queue.max_concurrent"));
}

#[test]
fn malformed_file_fails() {
    let env = Env::new();
    let path = env.write_config("[queue\n");

    env.tether()
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config file"));
}

#[test]
fn watch_requires_socket_url() {
    Env::new()
        .tether()
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no socket_url configured"));
}
