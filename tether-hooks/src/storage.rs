//! Key-value storage driver.
//!
//! [`KeyValueStore`] runs each operation through its own backend connection:
//! open the named (database, store) pair, perform exactly one operation,
//! close - even when the operation fails. No handle survives between calls.
//!
//! [`KeyEntry`] caches one key with a `loading`/`value`/`error` snapshot the
//! way presentation code consumes it: `loading` brackets the initial load
//! only, and a failed write leaves the cached value unchanged.

use serde::Deserialize;
use serde_json::Value;
use tether_platform::storage::{KvBackend, StorageError};
use tokio::sync::watch;

/// Which (database, store) namespace a store is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreOptions {
    /// Database name.
    pub database: String,
    /// Object store name within the database.
    pub store: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            database: "tether".to_string(),
            store: "keyval".to_string(),
        }
    }
}

/// Async key-value store with a per-call connection lifecycle.
#[derive(Debug, Clone)]
pub struct KeyValueStore<B: KvBackend> {
    backend: B,
    options: StoreOptions,
}

impl<B: KvBackend> KeyValueStore<B> {
    /// Bind a backend to a namespace.
    pub fn new(backend: B, options: StoreOptions) -> Self {
        Self { backend, options }
    }

    /// Read a key. A missing key is `Ok(None)`, never an error.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut conn = self
            .backend
            .open(&self.options.database, &self.options.store)
            .await?;
        let result = conn.get(key).await;
        let closed = conn.close().await;
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Write a key.
    pub async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut conn = self
            .backend
            .open(&self.options.database, &self.options.store)
            .await?;
        let result = conn.put(key, value).await;
        let closed = conn.close().await;
        result?;
        closed
    }

    /// Delete a key.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self
            .backend
            .open(&self.options.database, &self.options.store)
            .await?;
        let result = conn.delete(key).await;
        let closed = conn.close().await;
        result?;
        closed
    }

    /// Remove every entry in the store.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut conn = self
            .backend
            .open(&self.options.database, &self.options.store)
            .await?;
        let result = conn.clear().await;
        let closed = conn.close().await;
        result?;
        closed
    }
}

/// Snapshot of one cached key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryState {
    /// The initial load is in flight.
    pub loading: bool,
    /// Last known value (`None` for a missing key).
    pub value: Option<Value>,
    /// Last operation failure, if any.
    pub error: Option<String>,
}

/// One key of a [`KeyValueStore`], cached with an observable snapshot.
#[derive(Debug)]
pub struct KeyEntry<B: KvBackend> {
    store: KeyValueStore<B>,
    key: String,
    state: watch::Sender<EntryState>,
}

impl<B: KvBackend> KeyEntry<B> {
    /// Bind a key of `store`.
    pub fn new(store: KeyValueStore<B>, key: &str) -> Self {
        let (state, _) = watch::channel(EntryState::default());
        Self {
            store,
            key: key.to_string(),
            state,
        }
    }

    /// Load the key from the backend, bracketing with the `loading` flag.
    pub async fn load(&self) {
        self.state.send_modify(|s| s.loading = true);
        match self.store.get(&self.key).await {
            Ok(value) => self.state.send_modify(|s| {
                s.loading = false;
                s.value = value;
                s.error = None;
            }),
            Err(error) => self.state.send_modify(|s| {
                s.loading = false;
                s.error = Some(error.to_string());
            }),
        }
    }

    /// Write the key. A failure is returned AND recorded, and the cached
    /// value stays unchanged.
    pub async fn set(&self, value: Value) -> Result<(), StorageError> {
        match self.store.set(&self.key, value.clone()).await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.value = Some(value);
                    s.error = None;
                });
                Ok(())
            }
            Err(error) => {
                self.state
                    .send_modify(|s| s.error = Some(error.to_string()));
                Err(error)
            }
        }
    }

    /// Delete the key.
    pub async fn remove(&self) -> Result<(), StorageError> {
        match self.store.remove(&self.key).await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.value = None;
                    s.error = None;
                });
                Ok(())
            }
            Err(error) => {
                self.state
                    .send_modify(|s| s.error = Some(error.to_string()));
                Err(error)
            }
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> EntryState {
        self.state.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<EntryState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_platform::storage::MemoryBackend;

    fn store(backend: &MemoryBackend) -> KeyValueStore<MemoryBackend> {
        KeyValueStore::new(backend.clone(), StoreOptions::default())
    }

    #[tokio::test]
    async fn get_on_untouched_key_resolves_none() {
        let backend = MemoryBackend::new();
        let value = store(&backend).get("never-set").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let backend = MemoryBackend::new();
        let store = store(&backend);

        store.set("theme", json!("dark")).await.unwrap();
        assert_eq!(store.get("theme").await.unwrap(), Some(json!("dark")));

        store.remove("theme").await.unwrap();
        assert_eq!(store.get("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn every_operation_opens_and_closes_its_own_connection() {
        let backend = MemoryBackend::new();
        let store = store(&backend);

        store.set("a", json!(1)).await.unwrap();
        store.get("a").await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(backend.open_count(), 3);
        assert_eq!(backend.close_count(), 3);
    }

    #[tokio::test]
    async fn connection_closes_even_when_the_operation_fails() {
        let backend = MemoryBackend::new();
        let store = store(&backend);

        backend.fail_next_op("injected");
        assert!(store.set("k", json!(1)).await.is_err());
        assert_eq!(backend.open_count(), 1);
        assert_eq!(backend.close_count(), 1);
    }

    #[tokio::test]
    async fn unsupported_backend_surfaces_typed_error() {
        let backend = MemoryBackend::new();
        backend.set_unsupported(true);
        let result = store(&backend).get("k").await;
        assert!(matches!(result, Err(StorageError::Unsupported(_))));
    }

    #[tokio::test]
    async fn entry_load_brackets_with_loading_flag() {
        let backend = MemoryBackend::new();
        let store = store(&backend);
        store.set("count", json!(3)).await.unwrap();

        let entry = KeyEntry::new(store, "count");
        assert!(!entry.state().loading);
        entry.load().await;

        let state = entry.state();
        assert!(!state.loading);
        assert_eq!(state.value, Some(json!(3)));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn failed_set_keeps_cached_value_and_reports() {
        let backend = MemoryBackend::new();
        let entry = KeyEntry::new(store(&backend), "count");
        entry.set(json!(1)).await.unwrap();

        backend.fail_next_op("write refused");
        let result = entry.set(json!(2)).await;
        assert!(result.is_err());

        let state = entry.state();
        assert_eq!(state.value, Some(json!(1)));
        assert!(state.error.is_some());
        // The backend still holds the old value as well.
        assert_eq!(backend.peek("tether", "keyval", "count"), Some(json!(1)));
    }

    #[tokio::test]
    async fn failed_load_records_error_without_value() {
        let backend = MemoryBackend::new();
        let entry = KeyEntry::new(store(&backend), "k");
        backend.fail_next_open("db locked");
        entry.load().await;

        let state = entry.state();
        assert!(!state.loading);
        assert_eq!(state.value, None);
        assert!(state.error.is_some());
    }
}
