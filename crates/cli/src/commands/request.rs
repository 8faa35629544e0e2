// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tether::{Client, ClientConfig, Method, RequestDescriptor};

use crate::error::{Error, Result};

/// Builds the descriptor for `tether request`.
pub(crate) fn descriptor(
    method: &str,
    path: &str,
    body: Option<&str>,
    no_retry: bool,
) -> Result<RequestDescriptor> {
    let method = Method::parse(method).ok_or_else(|| Error::InvalidMethod(method.to_string()))?;
    let mut request = RequestDescriptor::new(method, path);
    if let Some(body) = body {
        request = request.with_body(serde_json::from_str(body).map_err(Error::InvalidBody)?);
    }
    if no_retry {
        request = request.non_idempotent();
    }
    Ok(request)
}

/// Sends one request through the queue and prints the response body.
pub async fn run(
    config: ClientConfig,
    method: &str,
    path: &str,
    body: Option<&str>,
    priority: i32,
    no_retry: bool,
) -> Result<()> {
    let request = descriptor(method, path, body, no_retry)?;
    let client = Client::new(config)?;
    let response = client.submit(request, priority).await?;
    tracing::debug!(status = response.status, "response received");
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(())
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
