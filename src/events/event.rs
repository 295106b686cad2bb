//! # Lifecycle events emitted by the runner and its supervisors.
//!
//! [`EventKind`] classifies events across three categories:
//! - **Run lifecycle**: started, log line captured, stopped
//! - **Subscriber diagnostics**: overflow and panic isolation reports
//! - **Shutdown**: whole-runner teardown progress
//!
//! The [`Event`] struct carries metadata: timestamp, run identifier, the
//! captured log entry, the exit outcome.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. For one run, `RunStarted` always precedes every `RunLog`,
//! which always precede the single terminal `RunStopped`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::logs::LogEntry;
use crate::runs::{ExitOutcome, RunId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runner events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run lifecycle events ===
    /// A run was accepted and its child process spawned.
    ///
    /// Sets: `run`, `at`, `seq`.
    RunStarted,

    /// One log line was captured (or produced by the supervisor).
    ///
    /// Published once per captured line, after the line was appended to the
    /// run's log buffer.
    ///
    /// Sets: `run`, `entry`, `at`, `seq`.
    RunLog,

    /// The run is fully retired: process exited or was killed, registry entry
    /// removed. Published exactly once per run.
    ///
    /// Sets: `run`, `exit`, `at`, `seq`.
    RunStopped,

    // === Subscriber diagnostics ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `run` (subscriber name), `reason`, `at`, `seq`.
    SubscriberOverflow,

    /// A subscriber panicked while processing an event.
    ///
    /// Sets: `run` (subscriber name), `reason`, `at`, `seq`.
    SubscriberPanicked,

    // === Shutdown events ===
    /// Whole-runner shutdown was requested; every active run is being stopped.
    ///
    /// Sets: `at`, `seq`.
    ShutdownRequested,

    /// Every run observed at shutdown has been retired.
    ///
    /// Sets: `at`, `seq`.
    AllStopped,
}

/// Runner event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Run identifier, if applicable. Subscriber diagnostics reuse this slot
    /// for the subscriber name.
    pub run: Option<RunId>,
    /// The captured log entry (`RunLog` only).
    pub entry: Option<LogEntry>,
    /// Terminal outcome (`RunStopped` only).
    pub exit: Option<ExitOutcome>,
    /// Human-readable reason (diagnostics).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            run: None,
            entry: None,
            exit: None,
            reason: None,
        }
    }

    /// Attaches a run identifier.
    #[inline]
    pub fn with_run(mut self, run: RunId) -> Self {
        self.run = Some(run);
        self
    }

    /// Attaches a captured log entry.
    #[inline]
    pub fn with_entry(mut self, entry: LogEntry) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Attaches a terminal exit outcome.
    #[inline]
    pub fn with_exit(mut self, exit: ExitOutcome) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a `RunStarted` event.
    #[inline]
    pub fn run_started(id: &RunId) -> Self {
        Event::new(EventKind::RunStarted).with_run(id.clone())
    }

    /// Creates a `RunLog` event carrying one captured line.
    #[inline]
    pub fn run_log(id: &RunId, entry: LogEntry) -> Self {
        Event::new(EventKind::RunLog).with_run(id.clone()).with_entry(entry)
    }

    /// Creates the terminal `RunStopped` event.
    #[inline]
    pub fn run_stopped(id: &RunId, exit: ExitOutcome) -> Self {
        Event::new(EventKind::RunStopped).with_run(id.clone()).with_exit(exit)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_run(RunId::new(subscriber))
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_run(RunId::new(subscriber))
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogEntry, LogLevel};

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::RunStarted);
        let b = Event::new(EventKind::RunStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_populate_fields() {
        let id = RunId::new("r1");
        let ev = Event::run_log(&id, LogEntry::new(LogLevel::Stdout, "hello"));
        assert_eq!(ev.kind, EventKind::RunLog);
        assert_eq!(ev.run.as_ref(), Some(&id));
        assert_eq!(ev.entry.as_ref().unwrap().message.as_ref(), "hello");

        let ev = Event::run_stopped(&id, ExitOutcome::Exited(0));
        assert_eq!(ev.exit, Some(ExitOutcome::Exited(0)));
    }
}
