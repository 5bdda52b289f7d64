//! # tether-hooks
//!
//! Stateful driver objects ("hooks") for UI code, built on the pure state
//! machines in `tether-core` and the capability seams in `tether-platform`.
//!
//! Each hook is an owned object exposing methods plus a read-only state
//! snapshot observable through `tokio::sync::watch`; there is no
//! framework-specific re-render signaling. Presentation code constructs a
//! hook, subscribes to its state, and invokes its methods.
//!
//! ## Example
//!
//! ```ignore
//! use tether_hooks::socket::{ReconnectingChannel, SocketOptions};
//! use tether_platform::MockTransport;
//!
//! let channel = ReconnectingChannel::new(
//!     "wss://example/live",
//!     MockTransport::new(),
//!     SocketOptions::default(),
//! );
//! channel.connect();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clipboard;
pub mod config;
pub mod geolocation;
pub mod hotkeys;
pub mod idle;
pub mod query;
pub mod selection;
pub mod share;
pub mod socket;
pub mod storage;
pub mod worker;

pub use clipboard::{ClipboardWriter, CopyState};
pub use config::{ConfigError, HooksConfig};
pub use geolocation::{GeoState, GeolocationReader};
pub use hotkeys::{EventDisposition, HotkeyBinding, HotkeyMap, HotkeyOptions};
pub use idle::{ActivityKind, IdleOptions, IdleWatcher};
pub use query::QueryParam;
pub use selection::{SelectionSnapshot, SelectionTracker};
pub use share::{ShareBroker, ShareState};
pub use socket::{ReconnectingChannel, SocketEvent, SocketOptions};
pub use storage::{EntryState, KeyEntry, KeyValueStore, StoreOptions};
pub use worker::{WorkerChannel, WorkerOptions};
