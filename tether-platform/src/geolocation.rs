//! Geolocation capability seam.
//!
//! One-shot reads plus a watch mode that streams position fixes into a
//! channel until the watch is cleared.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Geolocation errors, mirroring the host error codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeoError {
    /// The host has no geolocation surface.
    #[error("geolocation not supported")]
    Unsupported,

    /// The user denied the permission prompt.
    #[error("geolocation permission denied")]
    PermissionDenied,

    /// No position could be determined.
    #[error("position unavailable")]
    Unavailable,

    /// The host did not produce a fix in time.
    #[error("geolocation timed out")]
    Timeout,
}

/// A position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
    /// Altitude in meters, when the host provides it.
    pub altitude: Option<f64>,
    /// Heading in degrees clockwise from north.
    pub heading: Option<f64>,
    /// Ground speed in meters per second.
    pub speed: Option<f64>,
    /// Host timestamp of the fix (milliseconds).
    pub timestamp: u64,
}

/// Options forwarded to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoOptions {
    /// Request the most accurate fix available.
    pub enable_high_accuracy: bool,
    /// How long the host may take before reporting [`GeoError::Timeout`].
    pub timeout: Option<Duration>,
    /// Maximum acceptable age of a cached fix.
    pub maximum_age: Option<Duration>,
}

/// Host geolocation surface.
#[async_trait]
pub trait GeolocationCapability: Send + Sync {
    /// Whether the host has a geolocation surface.
    fn is_supported(&self) -> bool;

    /// Resolve one position fix.
    async fn current_position(&self, options: &GeoOptions) -> Result<Position, GeoError>;

    /// Start streaming fixes into `sink`; returns the watch id.
    fn watch(&self, sink: mpsc::UnboundedSender<Result<Position, GeoError>>) -> u64;

    /// Stop the watch with the given id.
    fn clear_watch(&self, id: u64);
}

/// Mock geolocation host.
///
/// Tests script the next one-shot result and push fixes to active watchers.
#[derive(Debug)]
pub struct MockGeolocation {
    inner: Arc<Mutex<MockGeolocationInner>>,
}

#[derive(Debug)]
struct MockGeolocationInner {
    supported: bool,
    next_fix: Option<Result<Position, GeoError>>,
    watchers: HashMap<u64, mpsc::UnboundedSender<Result<Position, GeoError>>>,
    next_watch_id: u64,
}

impl Default for MockGeolocation {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockGeolocationInner {
                supported: true,
                next_fix: None,
                watchers: HashMap::new(),
                next_watch_id: 1,
            })),
        }
    }
}

impl MockGeolocation {
    /// Create a supported mock with no scripted fix.
    pub fn new() -> Self {
        Self::default()
    }

    /// A plausible fix for tests.
    pub fn sample_position() -> Position {
        Position {
            latitude: 55.6761,
            longitude: 12.5683,
            accuracy: 12.0,
            altitude: None,
            heading: None,
            speed: None,
            timestamp: 1_700_000_000_000,
        }
    }

    /// Toggle the surface's presence.
    pub fn set_supported(&self, supported: bool) {
        self.inner.lock().unwrap().supported = supported;
    }

    /// Script the next one-shot result.
    pub fn set_next_fix(&self, fix: Result<Position, GeoError>) {
        self.inner.lock().unwrap().next_fix = Some(fix);
    }

    /// Push a fix to every active watcher.
    pub fn push_fix(&self, fix: Result<Position, GeoError>) {
        let inner = self.inner.lock().unwrap();
        for sink in inner.watchers.values() {
            let _ = sink.send(fix.clone());
        }
    }

    /// Number of active watchers.
    pub fn watcher_count(&self) -> usize {
        self.inner.lock().unwrap().watchers.len()
    }
}

impl Clone for MockGeolocation {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl GeolocationCapability for MockGeolocation {
    fn is_supported(&self) -> bool {
        self.inner.lock().unwrap().supported
    }

    async fn current_position(&self, _options: &GeoOptions) -> Result<Position, GeoError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.supported {
            return Err(GeoError::Unsupported);
        }
        inner.next_fix.take().unwrap_or(Err(GeoError::Unavailable))
    }

    fn watch(&self, sink: mpsc::UnboundedSender<Result<Position, GeoError>>) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_watch_id;
        inner.next_watch_id += 1;
        inner.watchers.insert(id, sink);
        id
    }

    fn clear_watch(&self, id: u64) {
        self.inner.lock().unwrap().watchers.remove(&id);
    }
}
