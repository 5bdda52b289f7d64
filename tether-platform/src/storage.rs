//! Key-value storage backend abstraction.
//!
//! Models an IndexedDB-style backend: a named (database, store) namespace is
//! opened per call, the store is created on first open, one operation runs,
//! and the connection is closed. No persistent handle is held across calls -
//! that lifecycle is enforced by the driver in `tether-hooks`; this module
//! only provides the seams.
//!
//! A missing key is `Ok(None)`, never an error.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend is not available in this environment.
    #[error("storage backend not supported: {0}")]
    Unsupported(String),

    /// Opening the (database, store) namespace failed.
    #[error("open failed: {0}")]
    OpenFailed(String),

    /// A transaction-level operation failed.
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

/// A key-value backend that hands out per-call connections.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Open a connection to the named (database, store) pair, creating the
    /// store if it does not exist yet.
    async fn open(
        &self,
        database: &str,
        store: &str,
    ) -> Result<Box<dyn KvConnection>, StorageError>;
}

/// One open connection, good for exactly one transaction's worth of work.
#[async_trait]
pub trait KvConnection: Send {
    /// Read a key. Absence is `Ok(None)`.
    async fn get(&mut self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Write a key.
    async fn put(&mut self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key succeeds.
    async fn delete(&mut self, key: &str) -> Result<(), StorageError>;

    /// Remove every entry in the store.
    async fn clear(&mut self) -> Result<(), StorageError>;

    /// Close the connection.
    async fn close(self: Box<Self>) -> Result<(), StorageError>;
}

type Namespace = (String, String);
type Stores = HashMap<Namespace, HashMap<String, Value>>;

/// In-memory backend for testing and headless hosts.
///
/// Namespaces are created on first open. Clones share state. Failure
/// injection covers the unsupported-environment case and per-operation
/// errors.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryBackendInner>>,
}

#[derive(Debug, Default)]
struct MemoryBackendInner {
    stores: Stores,
    unsupported: bool,
    fail_next_open: Option<String>,
    fail_next_op: Option<String>,
    open_count: u32,
    close_count: u32,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an environment without the backend: every open fails with
    /// [`StorageError::Unsupported`].
    pub fn set_unsupported(&self, unsupported: bool) {
        self.inner.lock().unwrap().unsupported = unsupported;
    }

    /// Cause the next open to fail with the given error.
    pub fn fail_next_open(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_open = Some(error.to_string());
    }

    /// Cause the next get/put/delete/clear to fail with the given error.
    pub fn fail_next_op(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_op = Some(error.to_string());
    }

    /// Number of connections opened so far.
    pub fn open_count(&self) -> u32 {
        self.inner.lock().unwrap().open_count
    }

    /// Number of connections closed so far.
    pub fn close_count(&self) -> u32 {
        self.inner.lock().unwrap().close_count
    }

    /// Direct read for test assertions, bypassing the connection lifecycle.
    pub fn peek(&self, database: &str, store: &str, key: &str) -> Option<Value> {
        self.inner
            .lock()
            .unwrap()
            .stores
            .get(&(database.to_string(), store.to_string()))
            .and_then(|entries| entries.get(key).cloned())
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn open(
        &self,
        database: &str,
        store: &str,
    ) -> Result<Box<dyn KvConnection>, StorageError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.unsupported {
            return Err(StorageError::Unsupported(
                "memory backend disabled for this environment".into(),
            ));
        }
        if let Some(error) = inner.fail_next_open.take() {
            return Err(StorageError::OpenFailed(error));
        }

        let namespace = (database.to_string(), store.to_string());
        // First open creates the store.
        inner.stores.entry(namespace.clone()).or_default();
        inner.open_count += 1;

        Ok(Box::new(MemoryConnection {
            backend: Arc::clone(&self.inner),
            namespace,
        }))
    }
}

/// A connection into one namespace of a [`MemoryBackend`].
struct MemoryConnection {
    backend: Arc<Mutex<MemoryBackendInner>>,
    namespace: Namespace,
}

impl MemoryConnection {
    fn check_op(inner: &mut MemoryBackendInner) -> Result<(), StorageError> {
        if let Some(error) = inner.fail_next_op.take() {
            return Err(StorageError::OperationFailed(error));
        }
        Ok(())
    }
}

#[async_trait]
impl KvConnection for MemoryConnection {
    async fn get(&mut self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut inner = self.backend.lock().unwrap();
        Self::check_op(&mut inner)?;
        Ok(inner
            .stores
            .get(&self.namespace)
            .and_then(|entries| entries.get(key).cloned()))
    }

    async fn put(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut inner = self.backend.lock().unwrap();
        Self::check_op(&mut inner)?;
        inner
            .stores
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.backend.lock().unwrap();
        Self::check_op(&mut inner)?;
        if let Some(entries) = inner.stores.get_mut(&self.namespace) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), StorageError> {
        let mut inner = self.backend.lock().unwrap();
        Self::check_op(&mut inner)?;
        if let Some(entries) = inner.stores.get_mut(&self.namespace) {
            entries.clear();
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), StorageError> {
        self.backend.lock().unwrap().close_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_then_get() {
        let backend = MemoryBackend::new();
        let mut conn = backend.open("app", "settings").await.unwrap();
        conn.put("theme", json!("dark")).await.unwrap();
        assert_eq!(conn.get("theme").await.unwrap(), Some(json!("dark")));
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_is_none_not_error() {
        let backend = MemoryBackend::new();
        let mut conn = backend.open("app", "settings").await.unwrap();
        assert_eq!(conn.get("never-written").await.unwrap(), None);
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn first_open_creates_the_store() {
        let backend = MemoryBackend::new();
        let conn = backend.open("app", "fresh").await.unwrap();
        conn.close().await.unwrap();
        // Store exists now, empty.
        assert_eq!(backend.peek("app", "fresh", "x"), None);
        assert_eq!(backend.open_count(), 1);
        assert_eq!(backend.close_count(), 1);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let backend = MemoryBackend::new();
        let mut a = backend.open("app", "a").await.unwrap();
        a.put("k", json!(1)).await.unwrap();
        a.close().await.unwrap();

        let mut b = backend.open("app", "b").await.unwrap();
        assert_eq!(b.get("k").await.unwrap(), None);
        b.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let backend = MemoryBackend::new();
        let mut conn = backend.open("app", "s").await.unwrap();
        conn.put("a", json!(1)).await.unwrap();
        conn.put("b", json!(2)).await.unwrap();
        conn.delete("a").await.unwrap();
        assert_eq!(conn.get("a").await.unwrap(), None);
        assert_eq!(conn.get("b").await.unwrap(), Some(json!(2)));

        conn.clear().await.unwrap();
        assert_eq!(conn.get("b").await.unwrap(), None);
        // Deleting a missing key succeeds.
        conn.delete("gone").await.unwrap();
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn unsupported_environment_fails_open() {
        let backend = MemoryBackend::new();
        backend.set_unsupported(true);
        let result = backend.open("app", "s").await;
        assert!(matches!(result, Err(StorageError::Unsupported(_))));
    }

    #[tokio::test]
    async fn injected_operation_failure() {
        let backend = MemoryBackend::new();
        let mut conn = backend.open("app", "s").await.unwrap();
        backend.fail_next_op("disk on fire");
        let result = conn.put("k", json!(1)).await;
        assert!(matches!(result, Err(StorageError::OperationFailed(_))));
        // The failure was consumed; the next operation succeeds.
        conn.put("k", json!(1)).await.unwrap();
        conn.close().await.unwrap();
    }
}
