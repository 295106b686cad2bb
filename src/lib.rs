//! # runvisor
//!
//! **Runvisor** is a process supervision and log-streaming engine for script
//! runners.
//!
//! It launches scripts as child processes, captures their stdout/stderr
//! concurrently line-by-line, tags and timestamps each line, fans lifecycle
//! events out to subscribers in real time, tracks running/finished state,
//! and enforces graceful-then-forced termination. The crate is designed as
//! the core of a larger runner: script discovery, persisted settings and the
//! web/UI layer are collaborators that talk to it through [`Runner`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   RunSpec    │   │   RunSpec    │   │   RunSpec    │
//!     │ (script #1)  │   │ (script #2)  │   │ (script #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner (composition root)                                        │
//! │  - Bus (broadcast events)                                         │
//! │  - RunRegistry (one active run per identifier)                    │
//! │  - LogStore (per-run ordered log history)                         │
//! │  - SubscriberSet (fans out to push subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │RunSupervisor │   │RunSupervisor │   │RunSupervisor │
//!     │ (one child,  │   │              │   │              │
//!     │  2 readers,  │   │              │   │              │
//!     │  wait task)  │   │              │   │              │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ Publishes        │                  │
//!      │ - RunStarted     │                  │
//!      │ - RunLog (1/line)│                  │
//!      │ - RunStopped     │                  │
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └───────────┬───────────────────────────────────┬───────────────────┘
//!             ▼                                   ▼
//!    subscribe_events()                    SubscriberSet
//!    (pull receivers)                    (per-sub queues + workers)
//! ```
//!
//! ### Lifecycle of one run
//! ```text
//! RunSpec ──► Runner::start_run ──► RunRegistry ──► RunSupervisor
//!
//!   ├─► path exists? registry free? child spawned?   (errors return here)
//!   ├─► publish RunStarted
//!   ├─► reader tasks: every non-empty line ──► LogStore + RunLog event
//!   ├─► wait: child exits  ──────────────► outcome from exit status
//!   │         stop requested ──► SIGTERM ──► grace ──► forced kill
//!   └─► exactly once: summary entry, registry removal, RunStopped
//! ```
//!
//! ## Guarantees
//! - `RunStarted` precedes every `RunLog` of a run, which precede its single
//!   terminal `RunStopped`.
//! - Within one stream, log order is exact; a concurrent reader of
//!   [`Runner::get_logs`] sees a strict prefix of the eventual history.
//! - Duplicate starts race-free: one wins, the rest get `AlreadyRunning`.
//! - A stop racing a natural exit publishes `RunStopped` exactly once.
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use runvisor::{Config, EventKind, Runner, RunSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = Runner::builder(Config::default()).build();
//!
//!     let spec = RunSpec::new("/opt/scripts/backup.sh", "backup")?;
//!     let id = spec.id().clone();
//!
//!     let mut events = runner.subscribe_events();
//!     runner.start_run(spec).await?;
//!
//!     while let Ok(ev) = events.recv().await {
//!         if ev.kind == EventKind::RunStopped && ev.run.as_ref() == Some(&id) {
//!             break;
//!         }
//!     }
//!
//!     for entry in runner.get_logs(&id).await {
//!         println!("{}: {}", entry.level.as_label(), entry.message);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod logs;
mod runs;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Runner, RunnerBuilder};
pub use error::{StartError, StopError};
pub use events::{Bus, Event, EventKind};
pub use logs::{LogEntry, LogLevel, LogStore};
pub use runs::{ExitOutcome, RunId, RunRecord, RunSpec, RunStatus};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
