//! Share capability seam.
//!
//! Wraps the host's share sheet. User cancellation is its own error variant
//! so the adapter can return it to the caller without recording it as an
//! application-level failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Share errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    /// The host has no share surface.
    #[error("share not supported")]
    Unsupported,

    /// The user dismissed the share sheet. Not an application failure.
    #[error("share canceled by user")]
    Canceled,

    /// Sharing failed.
    #[error("share failed: {0}")]
    Failed(String),
}

/// The payload offered to the share sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    /// Title of the shared item.
    pub title: Option<String>,
    /// Body text.
    pub text: Option<String>,
    /// Link.
    pub url: Option<String>,
}

/// Host share surface.
#[async_trait]
pub trait ShareCapability: Send + Sync {
    /// Whether a share surface exists at all.
    fn is_supported(&self) -> bool;

    /// Whether this particular payload is shareable.
    fn can_share(&self, data: &ShareData) -> bool;

    /// Present the share sheet with the payload.
    async fn share(&self, data: &ShareData) -> Result<(), ShareError>;
}

/// Outcome the mock should produce for the next share call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextOutcome {
    Succeed,
    Cancel,
    Fail,
}

/// Mock share surface recording successful shares.
#[derive(Debug)]
pub struct MockShare {
    inner: Arc<Mutex<MockShareInner>>,
}

#[derive(Debug)]
struct MockShareInner {
    supported: bool,
    shared: Vec<ShareData>,
    next: NextOutcome,
}

impl Default for MockShare {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockShareInner {
                supported: true,
                shared: Vec::new(),
                next: NextOutcome::Succeed,
            })),
        }
    }
}

impl MockShare {
    /// Create a supported, always-succeeding mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the share surface's presence.
    pub fn set_supported(&self, supported: bool) {
        self.inner.lock().unwrap().supported = supported;
    }

    /// Make the next share call report user cancellation.
    pub fn cancel_next(&self) {
        self.inner.lock().unwrap().next = NextOutcome::Cancel;
    }

    /// Make the next share call fail.
    pub fn fail_next(&self) {
        self.inner.lock().unwrap().next = NextOutcome::Fail;
    }

    /// Payloads shared successfully so far.
    pub fn shared(&self) -> Vec<ShareData> {
        self.inner.lock().unwrap().shared.clone()
    }
}

impl Clone for MockShare {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl ShareCapability for MockShare {
    fn is_supported(&self) -> bool {
        self.inner.lock().unwrap().supported
    }

    fn can_share(&self, data: &ShareData) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.supported
            && (data.title.is_some() || data.text.is_some() || data.url.is_some())
    }

    async fn share(&self, data: &ShareData) -> Result<(), ShareError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.supported {
            return Err(ShareError::Unsupported);
        }
        match std::mem::replace(&mut inner.next, NextOutcome::Succeed) {
            NextOutcome::Succeed => {
                inner.shared.push(data.clone());
                Ok(())
            }
            NextOutcome::Cancel => Err(ShareError::Canceled),
            NextOutcome::Fail => Err(ShareError::Failed("share sheet error".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ShareData {
        ShareData {
            title: Some("Tether".into()),
            text: None,
            url: Some("https://example.com".into()),
        }
    }

    #[tokio::test]
    async fn share_records_payload() {
        let share = MockShare::new();
        assert!(share.can_share(&payload()));
        share.share(&payload()).await.unwrap();
        assert_eq!(share.shared(), vec![payload()]);
    }

    #[tokio::test]
    async fn unsupported_fails_fast() {
        let share = MockShare::new();
        share.set_supported(false);
        assert!(!share.is_supported());
        assert!(!share.can_share(&payload()));
        assert_eq!(share.share(&payload()).await, Err(ShareError::Unsupported));
    }

    #[tokio::test]
    async fn cancellation_is_distinct_and_one_shot() {
        let share = MockShare::new();
        share.cancel_next();
        assert_eq!(share.share(&payload()).await, Err(ShareError::Canceled));
        // The outcome was consumed; the next call succeeds.
        share.share(&payload()).await.unwrap();
        assert_eq!(share.shared().len(), 1);
    }

    #[test]
    fn empty_payload_is_not_shareable() {
        let share = MockShare::new();
        assert!(!share.can_share(&ShareData::default()));
    }
}
