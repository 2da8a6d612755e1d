//! Diagnostic events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Factory` (lifecycle, scheduling), workers (task flow,
//!   worker lifecycle), `SubscriberSet` (overflow/panic).
//! - **Consumer**: the factory's listener, which updates `WorkerTracker` and
//!   fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
