// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test files,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio_tungstenite::tungstenite::Message;
use wiremock::{Mock, MockServer, Request};

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Isolated environment for one `tether` invocation.
///
/// The default config location points into a temp dir and every `TETHER_*`
/// variable is cleared, so only what a test passes explicitly applies.
pub struct Env {
    pub home: TempDir,
}

impl Env {
    pub fn new() -> Self {
        Env {
            home: TempDir::new().unwrap(),
        }
    }

    pub fn tether(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("tether");
        cmd.env("XDG_CONFIG_HOME", self.home.path())
            .env("HOME", self.home.path())
            .env_remove("TETHER_CONFIG")
            .env_remove("TETHER_BASE_URL")
            .env_remove("TETHER_SOCKET_URL")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Writes a config file and returns its path.
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.home.path().join("custom.toml");
        std::fs::write(&path, content).unwrap();
        path
    }
}

/// Mock HTTP service living on its own runtime.
///
/// The `tether` binary runs in a child process, so the server must keep
/// answering while the test thread blocks on the command.
pub struct StubServer {
    server: MockServer,
    runtime: Runtime,
}

impl StubServer {
    pub fn start() -> Self {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        StubServer { server, runtime }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Mounts a mock. Mocks mounted earlier win while they still match.
    pub fn mount(&self, mock: Mock) -> &Self {
        self.runtime.block_on(mock.mount(&self.server));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}

/// WebSocket peer that accepts one connection, sends `frames` and closes.
pub struct SocketPeer {
    pub url: String,
    _runtime: Runtime,
}

impl SocketPeer {
    pub fn start(frames: Vec<&'static str>) -> Self {
        let runtime = Runtime::new().unwrap();
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        runtime.spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            for frame in frames {
                ws.send(Message::Text(frame.into())).await.unwrap();
            }
            ws.close(None).await.unwrap();
            // Finish the closing handshake
            while let Some(Ok(_)) = ws.next().await {}
        });

        SocketPeer {
            url,
            _runtime: runtime,
        }
    }
}
