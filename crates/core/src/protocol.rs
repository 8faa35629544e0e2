// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wire forms exchanged with the remote service.
//!
//! The socket protocol is loose: frames are text, usually JSON objects
//! tagged with a `type` field. Anything else is still delivered, either as
//! untyped JSON or as the raw text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A JSON object carrying a string `type` tag.
    Typed {
        /// Value of the `type` field.
        kind: String,
        /// The whole parsed object, tag included.
        payload: Value,
    },
    /// Valid JSON without a type tag.
    Untyped(Value),
    /// Text that is not JSON.
    Raw(String),
}

impl Inbound {
    /// Parses a text frame. Never fails: unparseable text becomes [`Inbound::Raw`].
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                let kind = value
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                match kind {
                    Some(kind) => Inbound::Typed {
                        kind,
                        payload: value,
                    },
                    None => Inbound::Untyped(value),
                }
            }
            Err(_) => Inbound::Raw(text.to_string()),
        }
    }

    /// Returns the type tag, if any.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Inbound::Typed { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// An outbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Sent unchanged.
    Text(String),
    /// Serialized to compact JSON text.
    Json(Value),
}

impl Outbound {
    /// Serializes the payload to its text frame.
    pub fn into_wire(self) -> String {
        match self {
            Outbound::Text(text) => text,
            Outbound::Json(value) => value.to_string(),
        }
    }
}

impl From<String> for Outbound {
    fn from(text: String) -> Self {
        Outbound::Text(text)
    }
}

impl From<&str> for Outbound {
    fn from(text: &str) -> Self {
        Outbound::Text(text.to_string())
    }
}

impl From<Value> for Outbound {
    fn from(value: Value) -> Self {
        Outbound::Json(value)
    }
}

/// Predicates the poller uses to interpret a status-check result.
pub trait PollStatus {
    /// The remote task finished successfully.
    fn is_completed(&self) -> bool;

    /// The remote task finished with a failure.
    fn is_failed(&self) -> bool;

    /// Failure message reported by the remote, if any.
    fn failure_message(&self) -> Option<&str> {
        None
    }
}

/// Status of a long-running remote task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Every other field the server sent.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl TaskStatus {
    /// An in-progress status.
    pub fn pending() -> Self {
        TaskStatus::default()
    }

    /// A completed status.
    pub fn completed() -> Self {
        TaskStatus {
            completed: true,
            ..TaskStatus::default()
        }
    }

    /// A failed status with an optional message.
    pub fn failed(error: Option<String>) -> Self {
        TaskStatus {
            failed: true,
            error,
            ..TaskStatus::default()
        }
    }

    /// Adds a payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Decodes a status from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl PollStatus for TaskStatus {
    fn is_completed(&self) -> bool {
        self.completed
    }

    fn is_failed(&self) -> bool {
        self.failed
    }

    fn failure_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
