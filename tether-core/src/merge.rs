//! Recursive right-biased merge over JSON values.
//!
//! This module implements the deep-merge used to combine layered
//! configuration and props objects:
//! - Only plain records (JSON objects) are merged key-by-key
//! - Everything else (arrays, strings, numbers, booleans, null) is an opaque
//!   value replaced wholesale, never merged element-wise
//! - Later sources overwrite earlier ones (right-biased)
//!
//! Sources are never mutated; every merged level of the result is freshly
//! allocated.

use serde_json::{Map, Value};

/// Merge any number of JSON values into a fresh object, right-biased.
///
/// `Value::Null` sources are skipped entirely (they do not even contribute
/// absent keys), and non-object sources have no own keys to contribute.
/// For each key of each object source, in left-to-right order:
/// - a key new to the accumulator is copied in,
/// - an object-over-object collision merges recursively into a fresh map,
/// - any other collision replaces the accumulated value outright (arrays
///   included - the last array given wins, lengths are never combined).
///
/// With no sources the result is `{}`. This function cannot fail.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tether_core::merge;
///
/// let base = json!({"api": {"url": "/api", "timeout": 5000}});
/// let overlay = json!({"api": {"timeout": 10000}});
/// let merged = merge([&base, &overlay]);
/// assert_eq!(merged, json!({"api": {"url": "/api", "timeout": 10000}}));
/// ```
pub fn merge<'a>(sources: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut acc = Map::new();
    for source in sources {
        if let Value::Object(entries) = source {
            merge_into(&mut acc, entries);
        }
    }
    Value::Object(acc)
}

/// Fold one source object into the accumulator, key by key.
fn merge_into(acc: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, incoming) in source {
        match (acc.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(overlay)) => {
                merge_into(existing, overlay);
            }
            _ => {
                acc.insert(key.clone(), incoming.clone());
            }
        }
    }
}
