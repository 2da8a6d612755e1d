//! # Diagnostic sinks.
//!
//! ```text
//! Worker ── publish(Event) ──► Bus ──► Factory listener ──► SubscriberSet
//!                                                   ┌────────┼────────┐
//!                                                   ▼        ▼        ▼
//!                                              LogWriter  Metrics  Custom
//! ```
//!
//! Implement [`Subscribe`] to receive events; enable the `logging` feature
//! (on by default) for the built-in [`LogWriter`].

mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
mod embedded;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
