//! Runtime core: the factory and its workers.
//!
//! The public API from this module is [`Factory`] (with [`FactoryBuilder`] and
//! [`FactoryConfig`]), which owns the queue, the worker pool, and shutdown.
//!
//! Internal modules:
//! - [`runner`]: executes one task with panic isolation and event publishing;
//! - [`worker`]: the get / run / mark-done loop of a single worker;
//! - [`tracker`]: event-fed view of worker activity for stuck-worker reports;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod factory;
mod runner;
mod shutdown;
mod tracker;
mod worker;

pub use builder::FactoryBuilder;
pub use config::FactoryConfig;
pub use factory::Factory;
