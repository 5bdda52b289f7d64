//! # tether-platform
//!
//! Capability seams between the Tether state cores and their hosting
//! platform.
//!
//! Every platform dependency the hooks consume - the duplex transport, the
//! key-value backend, the worker execution context, clipboard, share,
//! geolocation, text selection, and the location/query string - is expressed
//! as an explicit trait here, never reached through an ambient global. Each
//! module ships an in-memory implementation usable both as a test double and
//! as a headless fallback.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clipboard;
pub mod geolocation;
pub mod location;
pub mod selection;
pub mod share;
pub mod storage;
pub mod transport;
pub mod worker;

pub use clipboard::{ClipboardCapability, ClipboardError, MockClipboard};
pub use geolocation::{GeoError, GeoOptions, GeolocationCapability, MockGeolocation, Position};
pub use location::{LocationHost, MemoryLocation};
pub use selection::{MockSelection, NodeId, RawSelection, Rect, SelectionPoint, SelectionSource};
pub use share::{MockShare, ShareCapability, ShareData, ShareError};
pub use storage::{KvBackend, KvConnection, MemoryBackend, StorageError};
pub use transport::{MockTransport, Transport, TransportError};
pub use worker::{FnHost, MockHost, WorkerError, WorkerHost};
