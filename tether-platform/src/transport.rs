//! Duplex transport abstraction.
//!
//! Abstracts the underlying connection mechanism (a websocket in the
//! browser, a mock for testing) behind a connection-oriented async trait:
//! - `connect()` establishes a connection with optional sub-protocols
//! - `send()` transmits a frame
//! - `recv()` receives the next frame, failing with `ConnectionClosed` when
//!   the peer goes away
//! - `close()` terminates gracefully
//!
//! The reconnecting channel in `tether-hooks` owns exactly one transport
//! handle at a time and drives it through this trait.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Trait for sending and receiving frames over a duplex connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to `url`, offering the given sub-protocols.
    async fn connect(&self, url: &str, protocols: &[String]) -> Result<(), TransportError>;

    /// Send a frame over the connection.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive the next frame.
    ///
    /// Blocks until a frame is available; fails with
    /// [`TransportError::ConnectionClosed`] when the connection ends.
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Mock transport for testing.
///
/// Allows queueing inbound frames and capturing sent frames for
/// verification. Clones share state, so a test can keep a handle while the
/// channel under test owns another.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_url: Option<String>,
    connected_protocols: Vec<String>,
    connect_count: u32,
    sent_frames: Vec<Vec<u8>>,
    receive_queue: VecDeque<Vec<u8>>,
    fail_connects_remaining: u32,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
    drain_as_close: bool,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame to be returned by a later `recv()` call.
    pub fn queue_frame(&self, data: Vec<u8>) {
        self.inner.lock().unwrap().receive_queue.push_back(data);
    }

    /// Get all frames that were sent.
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().sent_frames.clone()
    }

    /// Get the last frame that was sent.
    pub fn last_sent(&self) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().sent_frames.last().cloned()
    }

    /// URL of the most recent connect.
    pub fn connected_url(&self) -> Option<String> {
        self.inner.lock().unwrap().connected_url.clone()
    }

    /// Sub-protocols offered on the most recent connect.
    pub fn connected_protocols(&self) -> Vec<String> {
        self.inner.lock().unwrap().connected_protocols.clone()
    }

    /// Total number of `connect()` calls (reconnect accounting).
    pub fn connect_count(&self) -> u32 {
        self.inner.lock().unwrap().connect_count
    }

    /// Cause the next `count` connects to fail.
    pub fn fail_connects(&self, count: u32) {
        self.inner.lock().unwrap().fail_connects_remaining = count;
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_send = Some(error.to_string());
    }

    /// Cause the next recv() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_recv = Some(error.to_string());
    }

    /// When set, an empty receive queue reports `ConnectionClosed` instead
    /// of blocking forever - a forced close from the peer side.
    pub fn drain_as_close(&self, enabled: bool) {
        self.inner.lock().unwrap().drain_as_close = enabled;
    }

    /// Clear all state (frames, queue, connection, counters).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, url: &str, protocols: &[String]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connect_count += 1;

        if inner.fail_connects_remaining > 0 {
            inner.fail_connects_remaining -= 1;
            return Err(TransportError::ConnectionFailed("forced failure".into()));
        }

        inner.connected = true;
        inner.connected_url = Some(url.to_string());
        inner.connected_protocols = protocols.to_vec();
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_frames.push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap();

                if !inner.connected {
                    return Err(TransportError::ConnectionClosed);
                }
                if let Some(error) = inner.fail_next_recv.take() {
                    return Err(TransportError::ReceiveFailed(error));
                }
                if let Some(frame) = inner.receive_queue.pop_front() {
                    return Ok(frame);
                }
                if inner.drain_as_close {
                    inner.connected = false;
                    return Err(TransportError::ConnectionClosed);
                }
            }
            // Queue empty and no forced close: wait for a test to push more.
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.inner.lock().unwrap().connected = false;
        Ok(())
    }
}
