//! Worker execution-context abstraction.
//!
//! A [`WorkerHost`] is an isolated execution context the worker channel can
//! post payloads to and receive replies from. [`FnHost`] synthesizes a host
//! from a pure computation function: a spawned task runs the function once
//! per posted message and reports back a tagged success/error envelope. This
//! replaces the source platform's ship-a-closure-as-code path with a
//! message-passing task whose payload is data, not code.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Worker host errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The execution context has been terminated (or never existed).
    #[error("worker terminated")]
    Terminated,

    /// Posting a payload to the context failed.
    #[error("post failed: {0}")]
    PostFailed(String),

    /// The context itself signaled an error (not the computation).
    #[error("worker host error: {0}")]
    Host(String),
}

/// An isolated execution context with message-passing in both directions.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Post a payload into the context.
    async fn post(&self, payload: Value) -> Result<(), WorkerError>;

    /// Receive the next reply from the context.
    ///
    /// Blocks until a reply arrives; fails with [`WorkerError::Terminated`]
    /// once the context is gone, or [`WorkerError::Host`] on a context-level
    /// error signal.
    async fn recv(&self) -> Result<Value, WorkerError>;

    /// Tear down the context immediately. Idempotent.
    fn terminate(&self);

    /// Whether the context has been terminated.
    fn is_terminated(&self) -> bool;
}

/// A host synthesized from a pure computation function.
///
/// Each posted payload is handed to the function on a spawned task; the
/// result comes back as a tagged envelope (`{"type": "success", "data"}` or
/// `{"type": "error", "error"}`).
pub struct FnHost {
    requests: mpsc::UnboundedSender<Value>,
    replies: tokio::sync::Mutex<mpsc::UnboundedReceiver<Value>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    terminated: AtomicBool,
}

impl FnHost {
    /// Spawn a host around `f`.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        let (req_tx, mut req_rx) = mpsc::unbounded_channel::<Value>();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel::<Value>();

        let task = tokio::spawn(async move {
            while let Some(payload) = req_rx.recv().await {
                let envelope = match f(payload) {
                    Ok(data) => json!({"type": "success", "data": data}),
                    Err(error) => json!({"type": "error", "error": error}),
                };
                if reply_tx.send(envelope).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: req_tx,
            replies: tokio::sync::Mutex::new(reply_rx),
            task: Mutex::new(Some(task)),
            terminated: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl WorkerHost for FnHost {
    async fn post(&self, payload: Value) -> Result<(), WorkerError> {
        if self.is_terminated() {
            return Err(WorkerError::Terminated);
        }
        self.requests
            .send(payload)
            .map_err(|e| WorkerError::PostFailed(e.to_string()))
    }

    async fn recv(&self) -> Result<Value, WorkerError> {
        if self.is_terminated() {
            return Err(WorkerError::Terminated);
        }
        let mut replies = self.replies.lock().await;
        replies.recv().await.ok_or(WorkerError::Terminated)
    }

    fn terminate(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
        tracing::debug!("fn host terminated");
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl Drop for FnHost {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Mock host for testing.
///
/// Captures posted payloads and replays queued replies (or host-level
/// errors). An empty reply queue simply pends, which is how timeout paths
/// are exercised. Clones share state.
#[derive(Debug, Default)]
pub struct MockHost {
    inner: Arc<Mutex<MockHostInner>>,
}

#[derive(Debug, Default)]
struct MockHostInner {
    posted: Vec<Value>,
    replies: std::collections::VecDeque<Result<Value, String>>,
    fail_next_post: Option<String>,
    terminated: bool,
}

impl MockHost {
    /// Create a new mock host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a later `recv()`.
    pub fn queue_reply(&self, reply: Value) {
        self.inner.lock().unwrap().replies.push_back(Ok(reply));
    }

    /// Queue a host-level error signal for a later `recv()`.
    pub fn queue_host_error(&self, error: &str) {
        self.inner
            .lock()
            .unwrap()
            .replies
            .push_back(Err(error.to_string()));
    }

    /// Cause the next post() to fail with the given error.
    pub fn fail_next_post(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_post = Some(error.to_string());
    }

    /// All payloads posted so far.
    pub fn posted(&self) -> Vec<Value> {
        self.inner.lock().unwrap().posted.clone()
    }
}

impl Clone for MockHost {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl WorkerHost for MockHost {
    async fn post(&self, payload: Value) -> Result<(), WorkerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.terminated {
            return Err(WorkerError::Terminated);
        }
        if let Some(error) = inner.fail_next_post.take() {
            return Err(WorkerError::PostFailed(error));
        }
        inner.posted.push(payload);
        Ok(())
    }

    async fn recv(&self) -> Result<Value, WorkerError> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if inner.terminated {
                    return Err(WorkerError::Terminated);
                }
                if let Some(reply) = inner.replies.pop_front() {
                    return reply.map_err(WorkerError::Host);
                }
            }
            // No reply queued yet: pend like a busy worker.
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }

    fn terminate(&self) {
        self.inner.lock().unwrap().terminated = true;
    }

    fn is_terminated(&self) -> bool {
        self.inner.lock().unwrap().terminated
    }
}
