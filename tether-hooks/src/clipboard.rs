//! Clipboard write adapter.
//!
//! [`ClipboardWriter`] tries the async clipboard API first and falls back to
//! the legacy select-and-copy command; an error surfaces only when every
//! available path fails. Support is computed once at construction.

use tether_platform::clipboard::{ClipboardCapability, ClipboardError};
use tokio::sync::watch;

/// Snapshot of the last copy attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyState {
    /// A copy is in flight.
    pub busy: bool,
    /// Text of the last successful copy.
    pub copied: Option<String>,
    /// Last failure, if any.
    pub error: Option<String>,
}

/// Clipboard writer over one host capability.
#[derive(Debug)]
pub struct ClipboardWriter<C: ClipboardCapability> {
    clipboard: C,
    supported: bool,
    state: watch::Sender<CopyState>,
}

impl<C: ClipboardCapability> ClipboardWriter<C> {
    /// Wrap a clipboard capability.
    pub fn new(clipboard: C) -> Self {
        let supported = clipboard.has_async_api() || clipboard.has_legacy_copy();
        let (state, _) = watch::channel(CopyState::default());
        Self {
            clipboard,
            supported,
            state,
        }
    }

    /// Whether any write path exists at all.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Copy `text`, preferring the async API over the legacy command.
    pub async fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        if !self.supported {
            self.state
                .send_modify(|s| s.error = Some(ClipboardError::Unsupported.to_string()));
            return Err(ClipboardError::Unsupported);
        }

        self.state.send_modify(|s| s.busy = true);
        let result = self.write(text).await;
        match &result {
            Ok(()) => self.state.send_modify(|s| {
                s.busy = false;
                s.copied = Some(text.to_string());
                s.error = None;
            }),
            Err(error) => {
                let message = error.to_string();
                self.state.send_modify(|s| {
                    s.busy = false;
                    s.error = Some(message);
                });
            }
        }
        result
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        if self.clipboard.has_async_api() {
            match self.clipboard.write_text(text).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    tracing::debug!(%error, "async clipboard write failed, trying legacy copy");
                }
            }
        }
        if self.clipboard.has_legacy_copy() && self.clipboard.exec_copy(text) {
            return Ok(());
        }
        Err(ClipboardError::WriteFailed(
            "no write path succeeded".to_string(),
        ))
    }

    /// Current snapshot.
    pub fn state(&self) -> CopyState {
        self.state.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<CopyState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_platform::clipboard::MockClipboard;

    #[tokio::test]
    async fn copies_via_the_async_api() {
        let clipboard = MockClipboard::new();
        let writer = ClipboardWriter::new(clipboard.clone());

        writer.copy("hello").await.unwrap();
        assert_eq!(clipboard.written(), vec!["hello".to_string()]);

        let state = writer.state();
        assert_eq!(state.copied, Some("hello".to_string()));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn falls_back_to_the_legacy_command() {
        let clipboard = MockClipboard::new();
        clipboard.fail_async(true);
        let writer = ClipboardWriter::new(clipboard.clone());

        writer.copy("fallback").await.unwrap();
        assert_eq!(clipboard.written(), vec!["fallback".to_string()]);
        assert_eq!(writer.state().copied, Some("fallback".to_string()));
    }

    #[tokio::test]
    async fn errors_only_when_every_path_fails() {
        let clipboard = MockClipboard::new();
        clipboard.fail_async(true);
        clipboard.fail_legacy(true);
        let writer = ClipboardWriter::new(clipboard.clone());

        let result = writer.copy("dropped").await;
        assert!(matches!(result, Err(ClipboardError::WriteFailed(_))));
        assert!(clipboard.written().is_empty());

        let state = writer.state();
        assert!(state.copied.is_none());
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn no_path_at_all_is_unsupported() {
        let clipboard = MockClipboard::new();
        clipboard.set_async_available(false);
        clipboard.set_legacy_available(false);
        let writer = ClipboardWriter::new(clipboard);

        assert!(!writer.is_supported());
        let result = writer.copy("x").await;
        assert!(matches!(result, Err(ClipboardError::Unsupported)));
    }

    #[tokio::test]
    async fn a_later_success_clears_the_error() {
        let clipboard = MockClipboard::new();
        clipboard.set_legacy_available(false);
        clipboard.fail_async(true);
        let writer = ClipboardWriter::new(clipboard.clone());

        assert!(writer.copy("first").await.is_err());
        clipboard.fail_async(false);
        writer.copy("second").await.unwrap();

        let state = writer.state();
        assert_eq!(state.copied, Some("second".to_string()));
        assert!(state.error.is_none());
    }
}
