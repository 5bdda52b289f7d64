//! Worker request channel.
//!
//! [`WorkerChannel`] posts payloads into a [`WorkerHost`] and settles an
//! observable [`TaskState`] with the decoded reply. At most one request is
//! outstanding: a new post supersedes the previous one, whose reply is then
//! discarded.
//!
//! [`WorkerChannel::from_fn`] covers the common case of wrapping a pure
//! computation in its own execution context without writing a host by hand.

use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tether_core::task::{decode_reply, TaskError, TaskState};
use tether_platform::worker::{FnHost, WorkerError, WorkerHost};
use tokio::sync::watch;

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Maximum wait for a reply; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Terminate the host when a reply times out.
    pub terminate_on_timeout: bool,
    /// Terminate the host when the channel is dropped.
    pub terminate_on_drop: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            terminate_on_timeout: true,
            terminate_on_drop: true,
        }
    }
}

struct WorkerInner<H> {
    host: Mutex<Option<Arc<H>>>,
    options: WorkerOptions,
    state_tx: watch::Sender<TaskState>,
    settle_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// A request channel to one worker host.
pub struct WorkerChannel<H: WorkerHost + 'static> {
    inner: Arc<WorkerInner<H>>,
}

impl WorkerChannel<FnHost> {
    /// Wrap a pure computation in its own execution context.
    ///
    /// Must be called within a tokio runtime.
    pub fn from_fn<F>(f: F, options: WorkerOptions) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::with_host(FnHost::spawn(f), options)
    }
}

impl<H: WorkerHost + 'static> WorkerChannel<H> {
    /// Build the host from a factory.
    pub fn with_factory<F>(factory: F, options: WorkerOptions) -> Self
    where
        F: FnOnce() -> H,
    {
        Self::with_host(factory(), options)
    }

    /// Attach to an existing host.
    pub fn with_host(host: H, options: WorkerOptions) -> Self {
        let (state_tx, _) = watch::channel(TaskState::new());
        Self {
            inner: Arc::new(WorkerInner {
                host: Mutex::new(Some(Arc::new(host))),
                options,
                state_tx,
                settle_task: Mutex::new(None),
            }),
        }
    }

    /// Post a payload, superseding any outstanding request.
    ///
    /// With no live host the state settles with
    /// [`TaskError::NotInitialized`] and nothing is sent.
    pub fn post(&self, payload: Value) {
        if let Some(old) = self.inner.settle_task.lock().unwrap().take() {
            old.abort();
        }
        self.inner.state_tx.send_modify(TaskState::begin);

        let host = match self.inner.host.lock().unwrap().as_ref() {
            Some(host) if !host.is_terminated() => Arc::clone(host),
            _ => {
                self.inner
                    .state_tx
                    .send_modify(|s| s.settle_err(TaskError::NotInitialized));
                return;
            }
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            settle(inner, host, payload).await;
        });
        *self.inner.settle_task.lock().unwrap() = Some(task);
    }

    /// Tear down the host. Subsequent posts settle with
    /// [`TaskError::NotInitialized`]. Idempotent.
    pub fn terminate(&self) {
        if let Some(task) = self.inner.settle_task.lock().unwrap().take() {
            task.abort();
        }
        if let Some(host) = self.inner.host.lock().unwrap().take() {
            host.terminate();
        }
        // An aborted request never settles; clear the in-flight flag.
        self.inner.state_tx.send_modify(|s| s.loading = false);
    }

    /// Current request snapshot.
    pub fn state(&self) -> TaskState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to request snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.inner.state_tx.subscribe()
    }
}

impl<H: WorkerHost + 'static> Drop for WorkerChannel<H> {
    fn drop(&mut self) {
        if self.inner.options.terminate_on_drop {
            self.terminate();
        }
    }
}

impl<H: WorkerHost + 'static> std::fmt::Debug for WorkerChannel<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerChannel")
            .field("state", &*self.inner.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

/// Run one request to completion and settle the snapshot.
async fn settle<H: WorkerHost>(inner: Arc<WorkerInner<H>>, host: Arc<H>, payload: Value) {
    if let Err(error) = host.post(payload).await {
        inner
            .state_tx
            .send_modify(|s| s.settle_err(TaskError::Host(error.to_string())));
        return;
    }

    let reply = match inner.options.timeout {
        Some(limit) => match tokio::time::timeout(limit, host.recv()).await {
            Ok(reply) => reply,
            Err(_) => {
                tracing::warn!(?limit, "worker reply timed out");
                if inner.options.terminate_on_timeout {
                    host.terminate();
                }
                inner
                    .state_tx
                    .send_modify(|s| s.settle_err(TaskError::Timeout));
                return;
            }
        },
        None => host.recv().await,
    };

    match reply {
        Ok(payload) => match decode_reply(payload) {
            Ok(data) => inner.state_tx.send_modify(|s| s.settle_ok(data)),
            Err(message) => inner
                .state_tx
                .send_modify(|s| s.settle_err(TaskError::Execution(message))),
        },
        Err(WorkerError::Host(message)) => inner
            .state_tx
            .send_modify(|s| s.settle_err(TaskError::Host(message))),
        Err(error) => inner
            .state_tx
            .send_modify(|s| s.settle_err(TaskError::Host(error.to_string()))),
    }
}
