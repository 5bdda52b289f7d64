//! # tether-core
//!
//! Pure logic for Tether UI state cores (no I/O, instant tests).
//!
//! This crate implements the algorithms and state machines behind the Tether
//! hooks without any platform or timer I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (timers, platform capabilities) is performed by
//! `tether-hooks`, which interprets the actions produced by these state
//! machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod collection;
pub mod hotkey;
pub mod idle;
pub mod merge;
pub mod task;

pub use channel::{ChannelAction, ChannelEvent, ChannelMachine, RetryPolicy, SocketState};
pub use collection::{Bounded, Queue, Stack};
pub use hotkey::{Hotkey, KeyEvent, TargetKind};
pub use idle::{IdleAction, IdleEvent, IdleState};
pub use merge::merge;
pub use task::{decode_reply, TaskError, TaskState};
