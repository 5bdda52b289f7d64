//! Share sheet adapter.
//!
//! [`ShareBroker`] presents payloads to the host's share surface. A user
//! cancellation is returned to the caller but never recorded in the state
//! snapshot: dismissing the sheet is not an application failure.

use tether_platform::share::{ShareCapability, ShareData, ShareError};
use tokio::sync::watch;

/// Snapshot of the last share attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareState {
    /// A share sheet is open.
    pub busy: bool,
    /// The last attempt completed successfully.
    pub shared: bool,
    /// Last failure, if any. Cancellations are never recorded here.
    pub error: Option<String>,
}

/// Share adapter over one host capability.
#[derive(Debug)]
pub struct ShareBroker<S: ShareCapability> {
    surface: S,
    state: watch::Sender<ShareState>,
}

impl<S: ShareCapability> ShareBroker<S> {
    /// Wrap a share capability.
    pub fn new(surface: S) -> Self {
        let (state, _) = watch::channel(ShareState::default());
        Self { surface, state }
    }

    /// Whether the host has a share surface at all.
    pub fn is_supported(&self) -> bool {
        self.surface.is_supported()
    }

    /// Whether this particular payload is shareable.
    pub fn can_share(&self, data: &ShareData) -> bool {
        self.surface.can_share(data)
    }

    /// Present the share sheet with `data`.
    pub async fn share(&self, data: &ShareData) -> Result<(), ShareError> {
        if !self.surface.is_supported() {
            self.state
                .send_modify(|s| s.error = Some(ShareError::Unsupported.to_string()));
            return Err(ShareError::Unsupported);
        }

        self.state.send_modify(|s| s.busy = true);
        let result = self.surface.share(data).await;
        match &result {
            Ok(()) => self.state.send_modify(|s| {
                s.busy = false;
                s.shared = true;
                s.error = None;
            }),
            Err(ShareError::Canceled) => {
                tracing::debug!("share sheet dismissed");
                self.state.send_modify(|s| s.busy = false);
            }
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

    /// Current snapshot.
    pub fn state(&self) -> ShareState {
        self.state.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<ShareState> {
        self.state.subscribe()
    }
}
