//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging push observers into the
//! runner: a web layer forwarding events over a socket, a metrics exporter,
//! an audit log.
//!
//! Each subscriber gets a dedicated worker task and a bounded queue, so
//! backpressure is a per-subscriber concern: overflowing one observer never
//! blocks the supervisors or the other observers.
//!
//! ## Example
//! ```no_run
//! use async_trait::async_trait;
//! use runvisor::{Event, EventKind, Subscribe};
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Subscribe for Metrics {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::RunStopped) {
//!             // export a counter, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "metrics" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Push observer of run lifecycle events.
///
/// Each subscriber runs in isolation:
/// - **Bounded queue** buffers events (capacity via [`Self::queue_capacity`]).
/// - **Dedicated worker task** processes events sequentially (FIFO).
/// - **Panic isolation**: panics are caught and published as
///   `SubscriberPanicked`.
///
/// Implementations should use async I/O, avoid blocking the executor, and
/// handle their own errors.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's worker task, never in the publisher
    /// context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic diagnostics.
    ///
    /// Prefer short, descriptive names (e.g., "websocket", "metrics").
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// On overflow the new event is dropped for this subscriber only and a
    /// `SubscriberOverflow` event is published. Clamped to a minimum of 1.
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
