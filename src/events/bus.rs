//! # Event bus for broadcasting run lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (supervisors, reader
//! tasks, the runner itself).
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or fails; a slow
//!   observer cannot stall a producing supervisor.
//! - **Bounded capacity**: one ring buffer stores recent events for all
//!   receivers; laggards observe `RecvError::Lagged(n)` and skip `n` items.
//! - **No replay**: a receiver only sees events published after it
//!   subscribed. History is served by the log buffer, not the bus.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for run lifecycle events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); every component
/// that publishes holds its own clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to ≥ 1).
    ///
    /// Capacity is shared across all receivers, not per-subscriber.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers the event is dropped; the call still returns
    /// immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
