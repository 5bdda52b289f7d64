//! Reconnecting duplex channel.
//!
//! [`ReconnectingChannel`] owns exactly one transport handle at a time and
//! drives the pure [`ChannelMachine`] from `tether-core`: every transport
//! signal becomes a machine event, and the machine's actions (open/close the
//! transport, schedule or cancel the retry timer, notify subscribers) are
//! executed here on tokio tasks.
//!
//! Messages sent while the channel is not open are dropped with a warning,
//! never queued. A manual disconnect permanently disables auto-reconnect for
//! this instance.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tether_core::channel::{
    ChannelAction, ChannelEvent, ChannelMachine, RetryPolicy, SocketState,
};
use tether_platform::transport::{Transport, TransportError};
use tokio::sync::{mpsc, watch};

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Sub-protocols offered on connect.
    pub protocols: Vec<String>,
    /// Whether to auto-reconnect after a close.
    pub reconnect: bool,
    /// Delay before a scheduled reconnect.
    pub reconnect_interval: Duration,
    /// Maximum auto-reconnect attempts; `None` means unlimited.
    pub reconnect_attempts: Option<u32>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            protocols: Vec::new(),
            reconnect: true,
            reconnect_interval: Duration::from_secs(5),
            reconnect_attempts: Some(20),
        }
    }
}

impl SocketOptions {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            enabled: self.reconnect,
            max_attempts: self.reconnect_attempts,
        }
    }
}

/// Events delivered to the channel's subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The transport opened.
    Open,
    /// A frame arrived.
    Message(Vec<u8>),
    /// The transport signaled an error (state follows later signals).
    Error(String),
    /// The transport closed.
    Close,
}

struct ChannelInner<T> {
    transport: T,
    url: Mutex<String>,
    options: SocketOptions,
    machine: Mutex<ChannelMachine>,
    state_tx: watch::Sender<SocketState>,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<SocketEvent>>>,
    retry_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    link_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    // Bumped when the target address changes; tasks from an older epoch
    // exit without feeding stale events into the machine.
    epoch: AtomicU64,
}

/// A reconnecting channel over one [`Transport`].
pub struct ReconnectingChannel<T: Transport + 'static> {
    inner: Arc<ChannelInner<T>>,
}

impl<T: Transport + 'static> ReconnectingChannel<T> {
    /// Create a channel targeting `url`. Nothing connects until
    /// [`connect`](Self::connect) is called.
    pub fn new(url: &str, transport: T, options: SocketOptions) -> Self {
        let machine = ChannelMachine::new(options.retry_policy());
        let (state_tx, _) = watch::channel(SocketState::Closed);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(ChannelInner {
                transport,
                url: Mutex::new(url.to_string()),
                options,
                machine: Mutex::new(machine),
                state_tx,
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                retry_task: Mutex::new(None),
                link_task: Mutex::new(None),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Establish a connection. No-op if one is already open or in progress.
    ///
    /// Must be called within a tokio runtime.
    pub fn connect(&self) {
        apply(&self.inner, ChannelEvent::ConnectRequested);
    }

    /// Manually disconnect: cancels any pending reconnect, permanently
    /// disables auto-reconnect for this instance, closes the transport.
    pub fn disconnect(&self) {
        apply(&self.inner, ChannelEvent::DisconnectRequested);
    }

    /// Current connection state.
    pub fn state(&self) -> SocketState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SocketState> {
        self.inner.state_tx.subscribe()
    }

    /// Take the event receiver. Yields `Some` exactly once.
    pub fn events(&self) -> Option<mpsc::UnboundedReceiver<SocketEvent>> {
        self.inner.events_rx.lock().unwrap().take()
    }

    /// Auto-reconnect attempts since the last successful open.
    pub fn reconnect_attempts_made(&self) -> u32 {
        self.inner.machine.lock().unwrap().attempts()
    }

    /// The current target address.
    pub fn url(&self) -> String {
        self.inner.url.lock().unwrap().clone()
    }

    /// Send a binary message.
    ///
    /// Returns `false` (message dropped, not queued) when the channel is not
    /// open or the transport send fails.
    pub async fn send_message(&self, data: &[u8]) -> bool {
        if self.state() != SocketState::Open {
            tracing::warn!("channel not open, message dropped");
            return false;
        }
        match self.inner.transport.send(data).await {
            Ok(()) => true,
            Err(error) => {
                apply(
                    &self.inner,
                    ChannelEvent::TransportError(error.to_string()),
                );
                false
            }
        }
    }

    /// Serialize `message` as JSON and send it.
    pub async fn send_json_message<M: Serialize>(&self, message: &M) -> bool {
        match serde_json::to_vec(message) {
            Ok(bytes) => self.send_message(&bytes).await,
            Err(error) => {
                tracing::warn!(%error, "message not serializable, dropped");
                false
            }
        }
    }

    /// Change the target address: tears down the current transport and
    /// establishes a new connection with a fresh reconnect lifecycle.
    pub async fn set_url(&self, url: &str) {
        *self.inner.url.lock().unwrap() = url.to_string();
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(old) = self.inner.link_task.lock().unwrap().take() {
            old.abort();
        }
        if let Some(old) = self.inner.retry_task.lock().unwrap().take() {
            old.abort();
        }
        let _ = self.inner.transport.close().await;
        {
            let mut machine = self.inner.machine.lock().unwrap();
            *machine = ChannelMachine::new(self.inner.options.retry_policy());
            self.inner.state_tx.send_replace(machine.state());
        }
        apply(&self.inner, ChannelEvent::ConnectRequested);
    }

    /// Disconnect and close the transport, awaiting the close.
    pub async fn shutdown(&self) {
        apply(&self.inner, ChannelEvent::DisconnectRequested);
        let _ = self.inner.transport.close().await;
    }
}

impl<T: Transport + 'static> Drop for ReconnectingChannel<T> {
    fn drop(&mut self) {
        if let Some(task) = self.inner.retry_task.lock().unwrap().take() {
            task.abort();
        }
        if let Some(task) = self.inner.link_task.lock().unwrap().take() {
            task.abort();
        }
        // Unmount always closes the transport; best effort outside a runtime.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let inner = Arc::clone(&self.inner);
            handle.spawn(async move {
                let _ = inner.transport.close().await;
            });
        }
    }
}

/// Feed one event through the machine and execute the resulting actions.
fn apply<T: Transport + 'static>(inner: &Arc<ChannelInner<T>>, event: ChannelEvent) {
    let actions = {
        let mut machine = inner.machine.lock().unwrap();
        let (next, actions) = machine.clone().on_event(event);
        *machine = next;
        inner.state_tx.send_replace(machine.state());
        actions
    };

    for action in actions {
        match action {
            ChannelAction::OpenTransport => {
                let epoch = inner.epoch.load(Ordering::SeqCst);
                let link = Arc::clone(inner);
                let task = tokio::spawn(async move {
                    run_link(link, epoch).await;
                });
                if let Some(old) = inner.link_task.lock().unwrap().replace(task) {
                    old.abort();
                }
            }
            ChannelAction::CloseTransport => {
                let link = Arc::clone(inner);
                tokio::spawn(async move {
                    let _ = link.transport.close().await;
                });
            }
            ChannelAction::ScheduleRetry => {
                let interval = inner.options.reconnect_interval;
                let link = Arc::clone(inner);
                let task = tokio::spawn(async move {
                    tokio::time::sleep(interval).await;
                    apply(&link, ChannelEvent::RetryTimer);
                });
                if let Some(old) = inner.retry_task.lock().unwrap().replace(task) {
                    old.abort();
                }
            }
            ChannelAction::CancelRetry => {
                if let Some(old) = inner.retry_task.lock().unwrap().take() {
                    old.abort();
                }
            }
            ChannelAction::NotifyOpen => {
                let _ = inner.events_tx.send(SocketEvent::Open);
            }
            ChannelAction::NotifyClose => {
                let _ = inner.events_tx.send(SocketEvent::Close);
            }
            ChannelAction::NotifyError(error) => {
                let _ = inner.events_tx.send(SocketEvent::Error(error));
            }
        }
    }
}

/// One transport lifetime: connect, then pump frames until it closes.
async fn run_link<T: Transport + 'static>(inner: Arc<ChannelInner<T>>, epoch: u64) {
    let url = inner.url.lock().unwrap().clone();
    tracing::debug!(%url, "connecting transport");

    match inner
        .transport
        .connect(&url, &inner.options.protocols)
        .await
    {
        Ok(()) => {
            if stale(&inner, epoch) {
                return;
            }
            apply(&inner, ChannelEvent::TransportOpen);
        }
        Err(error) => {
            if stale(&inner, epoch) {
                return;
            }
            // A failed connect behaves like an immediate close: the retry
            // policy decides what happens next.
            apply(&inner, ChannelEvent::TransportError(error.to_string()));
            apply(&inner, ChannelEvent::TransportClosed);
            return;
        }
    }

    loop {
        match inner.transport.recv().await {
            Ok(frame) => {
                if stale(&inner, epoch) {
                    return;
                }
                let _ = inner.events_tx.send(SocketEvent::Message(frame));
            }
            Err(TransportError::ConnectionClosed) => {
                if stale(&inner, epoch) {
                    return;
                }
                apply(&inner, ChannelEvent::TransportClosed);
                return;
            }
            Err(error) => {
                if stale(&inner, epoch) {
                    return;
                }
                apply(&inner, ChannelEvent::TransportError(error.to_string()));
                apply(&inner, ChannelEvent::TransportClosed);
                return;
            }
        }
    }
}

fn stale<T>(inner: &ChannelInner<T>, epoch: u64) -> bool {
    inner.epoch.load(Ordering::SeqCst) != epoch
}
