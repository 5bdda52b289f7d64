//! Location / query-string capability seam.
//!
//! Reads and writes the current location's query string. A programmatic
//! write dispatches a navigation-change notification so every consumer of
//! the same key resynchronizes; the notification surfaces here as a
//! `tokio::sync::watch` channel carrying the full query string.

use tokio::sync::watch;

/// Host location surface.
pub trait LocationHost: Send + Sync {
    /// The current query string, without a leading `?`.
    fn read_query(&self) -> String;

    /// Replace the query string and notify subscribers.
    fn write_query(&self, query: &str);

    /// Subscribe to query-string changes.
    fn changes(&self) -> watch::Receiver<String>;
}

/// In-memory location for tests and headless hosts.
#[derive(Debug)]
pub struct MemoryLocation {
    query: watch::Sender<String>,
}

impl MemoryLocation {
    /// Create a location with the given initial query string.
    pub fn new(initial_query: &str) -> Self {
        let (query, _) = watch::channel(initial_query.to_string());
        Self { query }
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("")
    }
}

impl LocationHost for MemoryLocation {
    fn read_query(&self) -> String {
        self.query.borrow().clone()
    }

    fn write_query(&self, query: &str) {
        // send_replace notifies even with zero current subscribers.
        self.query.send_replace(query.to_string());
    }

    fn changes(&self) -> watch::Receiver<String> {
        self.query.subscribe()
    }
}
