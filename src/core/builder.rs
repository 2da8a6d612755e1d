use std::sync::Arc;

use crate::{
    core::FactoryConfig,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

use super::factory::Factory;

/// Builder for constructing a [`Factory`] with optional subscribers.
pub struct FactoryBuilder {
    cfg: FactoryConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl FactoryBuilder {
    pub fn new(cfg: FactoryConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive factory events (scheduling, task outcomes, worker
    /// lifecycle) through dedicated delivery tasks with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the factory, starting it when `autostart` is set.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> Factory {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let autostart = self.cfg.autostart;

        let factory = Factory::new_internal(self.cfg, bus, subs);
        if autostart {
            // A fresh factory is never stopped.
            let _ = factory.start();
        }
        factory
    }
}
