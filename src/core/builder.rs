//! # Builder wiring the runner's components together.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::events::Bus;
use crate::logs::LogStore;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::registry::RunRegistry;
use super::service::Runner;

/// Builder for a [`Runner`] instance.
pub struct RunnerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RunnerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets the push subscribers that observe run lifecycle events.
    ///
    /// Each gets a dedicated worker and bounded queue; see
    /// [`SubscriberSet`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the runner: bus, log store, registry, subscriber workers and
    /// the bus→subscribers listener.
    pub fn build(self) -> Arc<Runner> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let logs = Arc::new(LogStore::new(self.cfg.log_capacity_limit()));
        let registry = Arc::new(RunRegistry::new());

        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        spawn_subscriber_listener(&bus, subs);

        Arc::new(Runner {
            cfg: self.cfg,
            bus,
            registry,
            logs,
        })
    }
}

/// Forwards every bus event to the subscriber set (fire-and-forget).
///
/// The listener owns the set; it ends (and the set's workers wind down)
/// when the bus closes, i.e. when the runner is dropped.
fn spawn_subscriber_listener(bus: &Bus, subs: SubscriberSet) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => subs.emit(Arc::new(ev)),
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
        subs.shutdown().await;
    });
}
