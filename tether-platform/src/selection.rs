//! Text-selection capability seam.
//!
//! Exposes the host's current selection as a raw snapshot (text, client
//! rects, anchor/focus points, containing node) plus an ancestry query so
//! the tracker can restrict results to a scope element.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Opaque host node identity.
pub type NodeId = u64;

/// A client rectangle of a selected range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// One end of a selection: a node and a character offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPoint {
    /// The node holding this end.
    pub node: NodeId,
    /// Character offset within the node.
    pub offset: u32,
}

/// The host's current selection, before scope filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSelection {
    /// Selected text.
    pub text: String,
    /// Bounding rectangles of the selected ranges.
    pub rects: Vec<Rect>,
    /// Where the selection started.
    pub anchor: SelectionPoint,
    /// Where the selection ends.
    pub focus: SelectionPoint,
    /// The node containing the whole selection.
    pub container: NodeId,
    /// Whether anchor and focus coincide.
    pub collapsed: bool,
}

/// Host selection surface.
pub trait SelectionSource: Send + Sync {
    /// The current selection, or `None` when nothing is selected.
    fn snapshot(&self) -> Option<RawSelection>;

    /// Whether `node` is `scope` itself or one of its descendants.
    fn is_within(&self, node: NodeId, scope: NodeId) -> bool;
}

/// Mock selection source with a scriptable node tree.
#[derive(Debug, Default)]
pub struct MockSelection {
    inner: Arc<Mutex<MockSelectionInner>>,
}

#[derive(Debug, Default)]
struct MockSelectionInner {
    current: Option<RawSelection>,
    parents: HashMap<NodeId, NodeId>,
}

impl MockSelection {
    /// Create an empty mock (no selection, no tree).
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the current selection.
    pub fn set_selection(&self, selection: Option<RawSelection>) {
        self.inner.lock().unwrap().current = selection;
    }

    /// Declare `child`'s parent in the scripted node tree.
    pub fn set_parent(&self, child: NodeId, parent: NodeId) {
        self.inner.lock().unwrap().parents.insert(child, parent);
    }
}

impl Clone for MockSelection {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SelectionSource for MockSelection {
    fn snapshot(&self) -> Option<RawSelection> {
        self.inner.lock().unwrap().current.clone()
    }

    fn is_within(&self, node: NodeId, scope: NodeId) -> bool {
        let inner = self.inner.lock().unwrap();
        let mut cursor = node;
        loop {
            if cursor == scope {
                return true;
            }
            match inner.parents.get(&cursor) {
                Some(&parent) => cursor = parent,
                None => return false,
            }
        }
    }
}
