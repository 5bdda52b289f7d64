//! Hotkey bindings.
//!
//! [`HotkeyBinding`] holds one parsed hotkey with a callback and the
//! filtering policy; [`HotkeyMap`] holds an ordered set and dispatches to at
//! most the first matching entry. The caller's input layer feeds key events
//! to `handle()` and applies the returned [`EventDisposition`] (whether to
//! suppress the event).
//!
//! Rebinding swaps the descriptor or callback in place - the input layer's
//! subscription never needs to be re-established, and the active binding set
//! is always the latest.

use tether_core::hotkey::{Hotkey, KeyEvent, TargetKind};

/// Per-binding policy.
#[derive(Debug, Clone)]
pub struct HotkeyOptions {
    /// `false` disables the whole binding.
    pub enabled: bool,
    /// Allow events targeting form controls (input/textarea/select).
    pub enable_on_form_tags: bool,
    /// Allow events targeting content-editable regions.
    pub enable_on_content_editable: bool,
    /// Suppress the event's default action on match.
    pub prevent_default: bool,
    /// Stop the event's propagation on match.
    pub stop_propagation: bool,
}

impl Default for HotkeyOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_on_form_tags: false,
            enable_on_content_editable: false,
            prevent_default: true,
            stop_propagation: false,
        }
    }
}

/// What the input layer should do with the event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDisposition {
    /// A callback ran for this event.
    pub matched: bool,
    /// Suppress the default action.
    pub prevent_default: bool,
    /// Stop propagation.
    pub stop_propagation: bool,
}

impl EventDisposition {
    /// The pass-through disposition: nothing matched, nothing suppressed.
    pub fn unmatched() -> Self {
        Self {
            matched: false,
            prevent_default: false,
            stop_propagation: false,
        }
    }
}

type Callback = Box<dyn FnMut(&KeyEvent) + Send>;

/// Whether the policy allows events from this target kind.
fn target_allowed(options: &HotkeyOptions, target: TargetKind) -> bool {
    match target {
        TargetKind::Plain => true,
        TargetKind::FormField => options.enable_on_form_tags,
        TargetKind::Editable => options.enable_on_content_editable,
    }
}

/// One hotkey bound to one callback.
pub struct HotkeyBinding {
    hotkey: Hotkey,
    callback: Callback,
    options: HotkeyOptions,
}

impl HotkeyBinding {
    /// Bind `descriptor` (e.g. `"ctrl+s"`) to `callback`.
    pub fn new<F>(descriptor: &str, callback: F, options: HotkeyOptions) -> Self
    where
        F: FnMut(&KeyEvent) + Send + 'static,
    {
        Self {
            hotkey: Hotkey::parse(descriptor),
            callback: Box::new(callback),
            options,
        }
    }

    /// Swap the descriptor without touching the input subscription.
    pub fn rebind(&mut self, descriptor: &str) {
        self.hotkey = Hotkey::parse(descriptor);
    }

    /// Swap the callback without touching the input subscription.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&KeyEvent) + Send + 'static,
    {
        self.callback = Box::new(callback);
    }

    /// Replace the policy.
    pub fn set_options(&mut self, options: HotkeyOptions) {
        self.options = options;
    }

    /// Dispatch one key event.
    pub fn handle(&mut self, event: &KeyEvent) -> EventDisposition {
        if !self.options.enabled {
            return EventDisposition::unmatched();
        }
        if !target_allowed(&self.options, event.target) {
            tracing::debug!(?event.target, "hotkey suppressed by target policy");
            return EventDisposition::unmatched();
        }
        if !self.hotkey.matches(event) {
            return EventDisposition::unmatched();
        }

        (self.callback)(event);
        EventDisposition {
            matched: true,
            prevent_default: self.options.prevent_default,
            stop_propagation: self.options.stop_propagation,
        }
    }
}

impl std::fmt::Debug for HotkeyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyBinding")
            .field("hotkey", &self.hotkey)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// An ordered set of hotkey bindings sharing one policy.
///
/// Dispatch stops at the FIRST matching descriptor in insertion order.
pub struct HotkeyMap {
    entries: Vec<(Hotkey, Callback)>,
    options: HotkeyOptions,
}

impl HotkeyMap {
    /// Create an empty map with the given shared policy.
    pub fn new(options: HotkeyOptions) -> Self {
        Self {
            entries: Vec::new(),
            options,
        }
    }

    /// Append a descriptor -> callback entry.
    pub fn bind<F>(&mut self, descriptor: &str, callback: F)
    where
        F: FnMut(&KeyEvent) + Send + 'static,
    {
        self.entries
            .push((Hotkey::parse(descriptor), Box::new(callback)));
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of bound entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch one key event to at most the first matching entry.
    pub fn handle(&mut self, event: &KeyEvent) -> EventDisposition {
        if !self.options.enabled || !target_allowed(&self.options, event.target) {
            return EventDisposition::unmatched();
        }
        for (hotkey, callback) in &mut self.entries {
            if hotkey.matches(event) {
                callback(event);
                return EventDisposition {
                    matched: true,
                    prevent_default: self.options.prevent_default,
                    stop_propagation: self.options.stop_propagation,
                };
            }
        }
        EventDisposition::unmatched()
    }
}

impl std::fmt::Debug for HotkeyMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyMap")
            .field("entries", &self.entries.len())
            .field("options", &self.options)
            .finish()
    }
}
