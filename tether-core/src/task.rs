//! Worker task state and reply decoding.
//!
//! Tracks the bookkeeping of at most one outstanding worker request
//! (`loading` / `data` / `error`) and decodes worker replies. A reply is
//! either a tagged envelope - `{"type": "success", "data": ...}` or
//! `{"type": "error", "error": ...}` - or a raw payload, which is treated as
//! successful data. The envelope exists so a failure can cross the execution
//! boundary without relying on exceptions.

use serde_json::Value;
use thiserror::Error;

/// Errors a worker request can settle with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// No execution context exists; nothing was sent.
    #[error("worker not initialized")]
    NotInitialized,

    /// No response arrived within the configured timeout.
    #[error("worker response timed out")]
    Timeout,

    /// The computation itself reported a failure.
    #[error("worker execution failed: {0}")]
    Execution(String),

    /// The execution context signaled a context-level error.
    #[error("worker host error: {0}")]
    Host(String),
}

/// Bookkeeping for the current worker request.
///
/// After settling, exactly one of `data` / `error` is set and `loading` is
/// false. A new request supersedes the bookkeeping of the prior one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskState {
    /// A request is in flight.
    pub loading: bool,
    /// The successful result of the last settled request.
    pub data: Option<Value>,
    /// The failure of the last settled request.
    pub error: Option<TaskError>,
}

impl TaskState {
    /// Fresh state: nothing in flight, nothing settled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new request: loading set, prior error cleared.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Settle successfully with `data`.
    pub fn settle_ok(&mut self, data: Value) {
        self.loading = false;
        self.data = Some(data);
        self.error = None;
    }

    /// Settle with an error.
    pub fn settle_err(&mut self, error: TaskError) {
        self.loading = false;
        self.data = None;
        self.error = Some(error);
    }
}

/// Decode a worker reply payload.
///
/// A tagged envelope decodes to its success data or error message; anything
/// else is a raw payload treated as successful data.
pub fn decode_reply(payload: Value) -> Result<Value, String> {
    match payload.get("type").and_then(Value::as_str) {
        Some("success") => Ok(payload
            .get("data")
            .cloned()
            .unwrap_or(Value::Null)),
        Some("error") => Err(match payload.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => "unknown worker error".to_string(),
        }),
        _ => Ok(payload),
    }
}
