//! Hotkey descriptor parsing and matching.
//!
//! A hotkey is described by a `+`-joined, case-insensitive token string such
//! as `"ctrl+shift+s"` or `"meta+k"`. Parsing produces a canonical
//! modifier+key tuple; matching against an incoming key event requires an
//! EXACT match of all four modifier flags (an event holding an unbound extra
//! modifier never matches) plus a normalized key-name match.

/// Where a key event was targeted, for the form-field filtering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// An ordinary element; hotkeys apply by default.
    Plain,
    /// A form control (input / textarea / select); filtered unless enabled.
    FormField,
    /// A content-editable region; filtered unless enabled.
    Editable,
}

/// A keyboard event as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// The event's key name (pre-normalization, any case).
    pub key: String,
    /// Control held.
    pub ctrl: bool,
    /// Shift held.
    pub shift: bool,
    /// Alt held.
    pub alt: bool,
    /// Meta / command held.
    pub meta: bool,
    /// What kind of element the event targeted.
    pub target: TargetKind,
}

impl KeyEvent {
    /// Convenience constructor for a plain-target event with no modifiers.
    pub fn key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            target: TargetKind::Plain,
        }
    }
}

/// A parsed hotkey: canonical key name plus exact modifier flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    /// Normalized, lower-case key name.
    pub key: String,
    /// Requires control.
    pub ctrl: bool,
    /// Requires shift.
    pub shift: bool,
    /// Requires alt.
    pub alt: bool,
    /// Requires meta / command.
    pub meta: bool,
}

impl Hotkey {
    /// Parse a `+`-joined descriptor such as `"ctrl+shift+s"`.
    ///
    /// Modifier tokens (`ctrl`/`control`, `shift`, `alt`,
    /// `meta`/`cmd`/`command`) set flags; the first remaining token is taken
    /// as the key. Additional non-modifier tokens are a caller error and are
    /// ignored. Parsing never fails; an empty descriptor yields an empty key
    /// that matches nothing.
    pub fn parse(descriptor: &str) -> Self {
        let mut hotkey = Self {
            key: String::new(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        };

        for token in descriptor.split('+') {
            let token = token.trim().to_lowercase();
            match token.as_str() {
                "ctrl" | "control" => hotkey.ctrl = true,
                "shift" => hotkey.shift = true,
                "alt" => hotkey.alt = true,
                "meta" | "cmd" | "command" => hotkey.meta = true,
                "" => {}
                other => {
                    if hotkey.key.is_empty() {
                        hotkey.key = normalize_key(other);
                    } else {
                        tracing::warn!(token = other, "extra key token in hotkey ignored");
                    }
                }
            }
        }

        hotkey
    }

    /// Whether this hotkey matches the event.
    ///
    /// All four modifier flags must be exactly equal and the normalized key
    /// names must be equal. Target filtering is a separate policy applied by
    /// the binding, not here.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        !self.key.is_empty()
            && self.ctrl == event.ctrl
            && self.shift == event.shift
            && self.alt == event.alt
            && self.meta == event.meta
            && self.key == normalize_key(&event.key)
    }
}

/// Normalize a key name: lower-case plus the fixed alias table.
fn normalize_key(key: &str) -> String {
    let lower = key.to_lowercase();
    match lower.as_str() {
        "return" => "enter".to_string(),
        "esc" => "escape".to_string(),
        "spacebar" | " " => "space".to_string(),
        "up" => "arrowup".to_string(),
        "down" => "arrowdown".to_string(),
        "left" => "arrowleft".to_string(),
        "right" => "arrowright".to_string(),
        _ => lower,
    }
}
