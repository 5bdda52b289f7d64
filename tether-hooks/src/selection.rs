//! Text-selection tracker.
//!
//! [`SelectionTracker`] turns the host's raw selection into a filtered
//! snapshot: disabled trackers, collapsed selections, and selections outside
//! the configured scope all read as empty.

use tether_platform::selection::{NodeId, Rect, SelectionPoint, SelectionSource};
use tokio::sync::watch;

/// A filtered selection snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSnapshot {
    /// Selected text; empty when nothing qualifies.
    pub text: String,
    /// Bounding rectangles of the selected ranges.
    pub rects: Vec<Rect>,
    /// Where the selection started.
    pub anchor: Option<SelectionPoint>,
    /// Where the selection ends.
    pub focus: Option<SelectionPoint>,
}

impl SelectionSnapshot {
    /// The empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this snapshot carries no selection.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.anchor.is_none()
    }
}

/// Tracks the host selection, filtered by an enabled flag and a scope node.
#[derive(Debug)]
pub struct SelectionTracker<S: SelectionSource> {
    source: S,
    enabled: bool,
    scope: Option<NodeId>,
    snapshot: watch::Sender<SelectionSnapshot>,
}

impl<S: SelectionSource> SelectionTracker<S> {
    /// Wrap a selection source; enabled, unscoped.
    pub fn new(source: S) -> Self {
        let (snapshot, _) = watch::channel(SelectionSnapshot::empty());
        Self {
            source,
            enabled: true,
            scope: None,
            snapshot,
        }
    }

    /// Re-read the host selection and publish the filtered snapshot.
    ///
    /// The caller's input layer invokes this on selection-change signals.
    pub fn refresh(&self) -> SelectionSnapshot {
        let next = if self.enabled {
            match self.source.snapshot() {
                Some(raw) if !raw.collapsed && self.in_scope(raw.container) => {
                    SelectionSnapshot {
                        text: raw.text,
                        rects: raw.rects,
                        anchor: Some(raw.anchor),
                        focus: Some(raw.focus),
                    }
                }
                _ => SelectionSnapshot::empty(),
            }
        } else {
            SelectionSnapshot::empty()
        };
        self.snapshot.send_replace(next.clone());
        next
    }

    fn in_scope(&self, container: NodeId) -> bool {
        match self.scope {
            Some(scope) => self.source.is_within(container, scope),
            None => true,
        }
    }

    /// Enable or disable tracking. Disabling empties the snapshot.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.refresh();
    }

    /// Restrict (or unrestrict) tracking to selections within `scope`.
    pub fn set_scope(&mut self, scope: Option<NodeId>) {
        self.scope = scope;
        self.refresh();
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SelectionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SelectionSnapshot> {
        self.snapshot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_platform::selection::{MockSelection, RawSelection};

    fn selection_in(container: NodeId) -> RawSelection {
        RawSelection {
            text: "picked".into(),
            rects: vec![Rect {
                x: 1.0,
                y: 2.0,
                width: 30.0,
                height: 10.0,
            }],
            anchor: SelectionPoint {
                node: container,
                offset: 0,
            },
            focus: SelectionPoint {
                node: container,
                offset: 6,
            },
            container,
            collapsed: false,
        }
    }

    #[test]
    fn no_selection_reads_empty() {
        let tracker = SelectionTracker::new(MockSelection::new());
        assert!(tracker.refresh().is_empty());
    }

    #[test]
    fn selection_is_captured() {
        let source = MockSelection::new();
        source.set_selection(Some(selection_in(7)));
        let tracker = SelectionTracker::new(source);

        let snapshot = tracker.refresh();
        assert_eq!(snapshot.text, "picked");
        assert_eq!(snapshot.rects.len(), 1);
        assert_eq!(snapshot.anchor, Some(SelectionPoint { node: 7, offset: 0 }));
        assert_eq!(tracker.snapshot(), snapshot);
    }

    #[test]
    fn collapsed_selection_reads_empty() {
        let source = MockSelection::new();
        let mut raw = selection_in(7);
        raw.collapsed = true;
        raw.text.clear();
        source.set_selection(Some(raw));
        let tracker = SelectionTracker::new(source);
        assert!(tracker.refresh().is_empty());
    }

    #[test]
    fn out_of_scope_selection_reads_empty() {
        let source = MockSelection::new();
        // Scope node 1 contains node 2; node 9 is elsewhere.
        source.set_parent(2, 1);
        source.set_selection(Some(selection_in(9)));

        let mut tracker = SelectionTracker::new(source.clone());
        tracker.set_scope(Some(1));
        assert!(tracker.refresh().is_empty());

        source.set_selection(Some(selection_in(2)));
        assert_eq!(tracker.refresh().text, "picked");
    }

    #[test]
    fn disabling_empties_the_snapshot() {
        let source = MockSelection::new();
        source.set_selection(Some(selection_in(7)));
        let mut tracker = SelectionTracker::new(source);

        assert!(!tracker.refresh().is_empty());
        tracker.set_enabled(false);
        assert!(tracker.snapshot().is_empty());
        assert!(tracker.refresh().is_empty());

        tracker.set_enabled(true);
        assert!(!tracker.snapshot().is_empty());
    }
}
