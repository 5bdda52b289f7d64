//! Geolocation adapter.
//!
//! [`GeolocationReader`] resolves one-shot position fixes and can hold one
//! active watch whose fixes stream into the state snapshot. Dropping the
//! reader clears the watch.

use std::sync::{Arc, Mutex};
use tether_platform::geolocation::{GeoError, GeoOptions, GeolocationCapability, Position};
use tokio::sync::{mpsc, watch};

/// Snapshot of the latest position information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoState {
    /// A one-shot read is in flight.
    pub busy: bool,
    /// Last known fix.
    pub position: Option<Position>,
    /// Last failure, if any.
    pub error: Option<GeoError>,
}

/// Geolocation adapter over one host capability.
pub struct GeolocationReader<G: GeolocationCapability> {
    host: Arc<G>,
    options: GeoOptions,
    state: Arc<watch::Sender<GeoState>>,
    active_watch: Mutex<Option<(u64, tokio::task::JoinHandle<()>)>>,
}

impl<G: GeolocationCapability> GeolocationReader<G> {
    /// Wrap a geolocation capability.
    pub fn new(host: G, options: GeoOptions) -> Self {
        let (state, _) = watch::channel(GeoState::default());
        Self {
            host: Arc::new(host),
            options,
            state: Arc::new(state),
            active_watch: Mutex::new(None),
        }
    }

    /// Whether the host has a geolocation surface.
    pub fn is_supported(&self) -> bool {
        self.host.is_supported()
    }

    /// Resolve one fix and record it.
    pub async fn read(&self) -> Result<Position, GeoError> {
        if !self.host.is_supported() {
            self.state
                .send_modify(|s| s.error = Some(GeoError::Unsupported));
            return Err(GeoError::Unsupported);
        }

        self.state.send_modify(|s| s.busy = true);
        let result = self.host.current_position(&self.options).await;
        match &result {
            Ok(position) => {
                let position = position.clone();
                self.state.send_modify(|s| {
                    s.busy = false;
                    s.position = Some(position);
                    s.error = None;
                });
            }
            Err(error) => {
                let error = error.clone();
                self.state.send_modify(|s| {
                    s.busy = false;
                    s.error = Some(error);
                });
            }
        }
        result
    }

    /// Start streaming fixes into the snapshot. At most one watch is active;
    /// a second call is a no-op.
    ///
    /// Must be called within a tokio runtime.
    pub fn start_watch(&self) {
        let mut active = self.active_watch.lock().unwrap();
        if active.is_some() {
            return;
        }
        if !self.host.is_supported() {
            self.state
                .send_modify(|s| s.error = Some(GeoError::Unsupported));
            return;
        }

        let (sink, mut fixes) = mpsc::unbounded_channel();
        let id = self.host.watch(sink);
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            while let Some(fix) = fixes.recv().await {
                match fix {
                    Ok(position) => state.send_modify(|s| {
                        s.position = Some(position);
                        s.error = None;
                    }),
                    Err(error) => state.send_modify(|s| s.error = Some(error)),
                }
            }
        });
        *active = Some((id, task));
    }

    /// Stop the active watch, if any.
    pub fn stop_watch(&self) {
        if let Some((id, task)) = self.active_watch.lock().unwrap().take() {
            self.host.clear_watch(id);
            task.abort();
        }
    }

    /// Whether a watch is active.
    pub fn is_watching(&self) -> bool {
        self.active_watch.lock().unwrap().is_some()
    }

    /// Current snapshot.
    pub fn state(&self) -> GeoState {
        self.state.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<GeoState> {
        self.state.subscribe()
    }
}

impl<G: GeolocationCapability> Drop for GeolocationReader<G> {
    fn drop(&mut self) {
        self.stop_watch();
    }
}

impl<G: GeolocationCapability> std::fmt::Debug for GeolocationReader<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeolocationReader")
            .field("options", &self.options)
            .field("watching", &self.is_watching())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_platform::geolocation::MockGeolocation;

    #[tokio::test]
    async fn one_shot_read_records_the_fix() {
        let host = MockGeolocation::new();
        host.set_next_fix(Ok(MockGeolocation::sample_position()));
        let reader = GeolocationReader::new(host, GeoOptions::default());

        let fix = reader.read().await.unwrap();
        assert_eq!(fix, MockGeolocation::sample_position());

        let state = reader.state();
        assert!(!state.busy);
        assert_eq!(state.position, Some(MockGeolocation::sample_position()));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn read_failure_is_recorded() {
        let host = MockGeolocation::new();
        host.set_next_fix(Err(GeoError::PermissionDenied));
        let reader = GeolocationReader::new(host, GeoOptions::default());

        assert_eq!(reader.read().await, Err(GeoError::PermissionDenied));
        assert_eq!(reader.state().error, Some(GeoError::PermissionDenied));
    }

    #[tokio::test]
    async fn unsupported_host_fails_fast() {
        let host = MockGeolocation::new();
        host.set_supported(false);
        let reader = GeolocationReader::new(host, GeoOptions::default());

        assert!(!reader.is_supported());
        assert_eq!(reader.read().await, Err(GeoError::Unsupported));
    }

    #[tokio::test]
    async fn watch_streams_fixes_into_the_snapshot() {
        let host = MockGeolocation::new();
        let reader = GeolocationReader::new(host.clone(), GeoOptions::default());
        let mut states = reader.subscribe();

        reader.start_watch();
        assert!(reader.is_watching());
        assert_eq!(host.watcher_count(), 1);

        host.push_fix(Ok(MockGeolocation::sample_position()));
        states.changed().await.unwrap();
        assert_eq!(
            states.borrow().position,
            Some(MockGeolocation::sample_position())
        );

        reader.stop_watch();
        assert!(!reader.is_watching());
        assert_eq!(host.watcher_count(), 0);
    }

    #[tokio::test]
    async fn second_start_watch_is_a_no_op() {
        let host = MockGeolocation::new();
        let reader = GeolocationReader::new(host.clone(), GeoOptions::default());
        reader.start_watch();
        reader.start_watch();
        assert_eq!(host.watcher_count(), 1);
    }

    #[tokio::test]
    async fn drop_clears_the_watch() {
        let host = MockGeolocation::new();
        {
            let reader = GeolocationReader::new(host.clone(), GeoOptions::default());
            reader.start_watch();
            assert_eq!(host.watcher_count(), 1);
        }
        assert_eq!(host.watcher_count(), 0);
    }
}
