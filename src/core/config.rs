//! # Factory configuration.
//!
//! Provides [`FactoryConfig`], the construction parameters of a
//! [`Factory`](crate::Factory).
//!
//! ## Sentinel values
//! - `size = 0` → number of logical CPUs on the host
//! - `max_queue_size = 0` → `size * 3`
//! - `max_queue_size < size` → raised to `size`

use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

/// Construction parameters of a factory.
///
/// ## Field semantics
/// - `size`: number of workers (`0` = logical core count)
/// - `max_queue_size`: in-flight capacity of the queue (`0` = `size * 3`, never below `size`)
/// - `autostart`: start the factory as soon as it is built
/// - `grace`: how long `terminate()` waits for workers before aborting them
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// Prefer the helper accessors to sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct FactoryConfig {
    /// Number of workers.
    pub size: usize,

    /// Maximum number of tasks queued or running at once.
    ///
    /// `run()` waits while this many tasks are unfinished. A running task
    /// holds its slot, so values below `size` are raised to `size`;
    /// otherwise workers would sit idle while producers wait.
    pub max_queue_size: usize,

    /// Call `start()` when the factory is built.
    pub autostart: bool,

    /// Upper bound on `terminate()`'s wait for workers to exit.
    ///
    /// Workers stop at their next await point once cancelled; only a job that
    /// blocks its thread can hold one past this.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl FactoryConfig {
    /// Config with `size` workers and everything else default.
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Effective number of workers.
    #[inline]
    pub fn worker_count(&self) -> usize {
        match self.size {
            0 => thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            n => n,
        }
    }

    /// Effective queue capacity.
    #[inline]
    pub fn queue_capacity(&self) -> usize {
        let size = self.worker_count();
        match self.max_queue_size {
            0 => size.saturating_mul(3),
            n => n.max(size),
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for FactoryConfig {
    /// Default configuration:
    ///
    /// - `size = 0` (one worker per logical core)
    /// - `max_queue_size = 0` (three slots per worker)
    /// - `autostart = true`
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            size: 0,
            max_queue_size: 0,
            autostart: true,
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_resolve() {
        let cfg = FactoryConfig::default();
        assert!(cfg.worker_count() >= 1);
        assert_eq!(cfg.queue_capacity(), cfg.worker_count() * 3);

        let cfg = FactoryConfig::with_size(4);
        assert_eq!(cfg.worker_count(), 4);
        assert_eq!(cfg.queue_capacity(), 12);

        let cfg = FactoryConfig {
            max_queue_size: 2,
            bus_capacity: 0,
            ..FactoryConfig::with_size(4)
        };
        assert_eq!(cfg.queue_capacity(), 4);
        assert_eq!(cfg.bus_capacity_clamped(), 1);

        let cfg = FactoryConfig {
            max_queue_size: 2,
            ..FactoryConfig::with_size(1)
        };
        assert_eq!(cfg.queue_capacity(), 2);
    }
}
