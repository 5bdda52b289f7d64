//! Clipboard capability seam.
//!
//! Two write paths exist on real hosts: the async clipboard API and the
//! legacy select-and-copy command. The adapter in `tether-hooks` tries the
//! async path first and falls back to the legacy one; this module only
//! exposes both paths and their availability.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Clipboard errors.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No clipboard write path is available in this environment.
    #[error("clipboard not supported")]
    Unsupported,

    /// Writing failed on every available path.
    #[error("clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Host clipboard surface.
#[async_trait]
pub trait ClipboardCapability: Send + Sync {
    /// Whether the async write API exists.
    fn has_async_api(&self) -> bool;

    /// Write via the async API.
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Whether the legacy copy command exists.
    fn has_legacy_copy(&self) -> bool;

    /// Write via the legacy select-and-copy command; returns success.
    fn exec_copy(&self, text: &str) -> bool;
}

/// Mock clipboard recording writes, with both paths toggleable.
#[derive(Debug)]
pub struct MockClipboard {
    inner: Arc<Mutex<MockClipboardInner>>,
}

#[derive(Debug)]
struct MockClipboardInner {
    written: Vec<String>,
    async_available: bool,
    legacy_available: bool,
    fail_async: bool,
    fail_legacy: bool,
}

impl Default for MockClipboard {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockClipboardInner {
                written: Vec::new(),
                async_available: true,
                legacy_available: true,
                fail_async: false,
                fail_legacy: false,
            })),
        }
    }
}

impl MockClipboard {
    /// Create a mock with both paths available and working.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the async API's presence.
    pub fn set_async_available(&self, available: bool) {
        self.inner.lock().unwrap().async_available = available;
    }

    /// Toggle the legacy command's presence.
    pub fn set_legacy_available(&self, available: bool) {
        self.inner.lock().unwrap().legacy_available = available;
    }

    /// Make the async path fail even though it is present.
    pub fn fail_async(&self, fail: bool) {
        self.inner.lock().unwrap().fail_async = fail;
    }

    /// Make the legacy path fail even though it is present.
    pub fn fail_legacy(&self, fail: bool) {
        self.inner.lock().unwrap().fail_legacy = fail;
    }

    /// Everything written so far, in order.
    pub fn written(&self) -> Vec<String> {
        self.inner.lock().unwrap().written.clone()
    }
}

impl Clone for MockClipboard {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl ClipboardCapability for MockClipboard {
    fn has_async_api(&self) -> bool {
        self.inner.lock().unwrap().async_available
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.async_available {
            return Err(ClipboardError::Unsupported);
        }
        if inner.fail_async {
            return Err(ClipboardError::WriteFailed("permission denied".into()));
        }
        inner.written.push(text.to_string());
        Ok(())
    }

    fn has_legacy_copy(&self) -> bool {
        self.inner.lock().unwrap().legacy_available
    }

    fn exec_copy(&self, text: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.legacy_available || inner.fail_legacy {
            return false;
        }
        inner.written.push(text.to_string());
        true
    }
}
