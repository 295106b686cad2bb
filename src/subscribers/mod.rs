//! # Event subscribers: push-style observers of the run lifecycle.
//!
//! The bus ([`Bus`](crate::events::Bus)) is pull-style; this module provides
//! the push side. A single listener drains the bus and fans every event out
//! to user subscribers through [`SubscriberSet`].
//!
//! ## Architecture
//! ```text
//! Supervisors ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                ┌─────────┼─────────┐
//!                                                ▼         ▼         ▼
//!                                            [queue 1] [queue 2] [queue N]
//!                                                ▼         ▼         ▼
//!                                            worker 1  worker 2  worker N
//!                                                ▼         ▼         ▼
//!                                           sub1.on_event()  ...  subN.on_event()
//! ```
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event for that subscriber only and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Panics are caught and reported as `EventKind::SubscriberPanicked`.

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
