//! Query-string parameter binding.
//!
//! [`QueryParam`] binds one key of the location's query string. Writes
//! rewrite only that key and preserve every other pair; the location host
//! notifies all subscribers, so multiple bindings of the same key stay in
//! sync.

use std::sync::Arc;
use tether_platform::location::LocationHost;
use tokio::sync::watch;
use url::form_urlencoded;

/// One key of the query string.
#[derive(Debug, Clone)]
pub struct QueryParam<L: LocationHost> {
    location: Arc<L>,
    key: String,
}

impl<L: LocationHost> QueryParam<L> {
    /// Bind `key` on a (shared) location host.
    pub fn new(location: Arc<L>, key: &str) -> Self {
        Self {
            location,
            key: key.to_string(),
        }
    }

    /// Current decoded value, or `None` when the key is absent.
    pub fn get(&self) -> Option<String> {
        let query = self.location.read_query();
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k.as_ref() == self.key)
            .map(|(_, v)| v.into_owned())
    }

    /// Set the key, preserving every other pair.
    pub fn set(&self, value: &str) {
        self.write(Some(value));
    }

    /// Remove the key, preserving every other pair.
    pub fn remove(&self) {
        self.write(None);
    }

    /// Subscribe to query-string changes (the whole string; re-read with
    /// [`get`](Self::get) on notification).
    pub fn changes(&self) -> watch::Receiver<String> {
        self.location.changes()
    }

    fn write(&self, value: Option<&str>) {
        let current = self.location.read_query();
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut placed = false;
        for (k, v) in form_urlencoded::parse(current.as_bytes()) {
            if k.as_ref() == self.key {
                // Duplicate occurrences of the key collapse into one.
                if !placed {
                    if let Some(value) = value {
                        serializer.append_pair(&k, value);
                    }
                    placed = true;
                }
            } else {
                serializer.append_pair(&k, &v);
            }
        }
        if !placed {
            if let Some(value) = value {
                serializer.append_pair(&self.key, value);
            }
        }
        self.location.write_query(&serializer.finish());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_platform::location::MemoryLocation;

    #[test]
    fn absent_key_reads_none() {
        let location = Arc::new(MemoryLocation::new("other=1"));
        let param = QueryParam::new(location, "page");
        assert_eq!(param.get(), None);
    }

    #[test]
    fn set_preserves_unrelated_pairs() {
        let location = Arc::new(MemoryLocation::new("a=1&b=2"));
        let param = QueryParam::new(Arc::clone(&location), "page");

        param.set("3");
        assert_eq!(location.read_query(), "a=1&b=2&page=3");
        assert_eq!(param.get(), Some("3".to_string()));

        param.set("4");
        assert_eq!(location.read_query(), "a=1&b=2&page=4");
    }

    #[test]
    fn remove_deletes_only_its_key() {
        let location = Arc::new(MemoryLocation::new("page=3&a=1"));
        let param = QueryParam::new(Arc::clone(&location), "page");

        param.remove();
        assert_eq!(location.read_query(), "a=1");
        assert_eq!(param.get(), None);

        // Removing an absent key leaves the rest alone.
        param.remove();
        assert_eq!(location.read_query(), "a=1");
    }

    #[test]
    fn values_are_encoded_and_decoded() {
        let location = Arc::new(MemoryLocation::default());
        let param = QueryParam::new(location, "q");

        param.set("a b&c=d");
        assert_eq!(param.get(), Some("a b&c=d".to_string()));
    }

    #[test]
    fn duplicate_keys_collapse_on_write() {
        let location = Arc::new(MemoryLocation::new("page=1&page=2&a=1"));
        let param = QueryParam::new(Arc::clone(&location), "page");

        param.set("9");
        assert_eq!(location.read_query(), "page=9&a=1");
    }

    #[tokio::test]
    async fn bindings_of_the_same_location_stay_in_sync() {
        let location = Arc::new(MemoryLocation::default());
        let writer = QueryParam::new(Arc::clone(&location), "tab");
        let reader = QueryParam::new(Arc::clone(&location), "tab");
        let mut changes = reader.changes();

        writer.set("settings");
        changes.changed().await.unwrap();
        assert_eq!(reader.get(), Some("settings".to_string()));
    }
}
