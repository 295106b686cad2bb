//! # Per-run bookkeeping: status, exit outcome, record.
//!
//! One [`RunRecord`] exists per execution attempt. It is created when a start
//! request is accepted and mutated only by the supervisor that owns the run
//! (single-writer); everyone else reads snapshots.
//!
//! ## State machine
//! ```text
//! Starting ──► Running ──► Terminated          (natural exit)
//!                 │
//!                 └──► Stopping ──► Terminated (stop request)
//! ```
//! `Terminated` is absorbing: no further transitions or events occur for the
//! run instance.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use crate::runs::{RunId, RunSpec};

/// Lifecycle phase of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Accepted and registered; the child process is being created.
    Starting,
    /// Child process alive, output capture in progress.
    Running,
    /// Stop requested; graceful-then-forced termination in progress.
    Stopping,
    /// Child exited or was killed; the run is fully retired.
    Terminated,
}

impl RunStatus {
    /// `true` for every phase except [`RunStatus::Terminated`].
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, RunStatus::Terminated)
    }
}

/// How a run's child process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Natural exit with the given code.
    Exited(i32),
    /// Killed by a signal: a graceful stop, the forced kill, or an external
    /// signal. On platforms without exit-by-signal this covers any exit
    /// without a code.
    Terminated,
}

impl ExitOutcome {
    /// `true` only for a clean zero exit.
    #[inline]
    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }

    /// The exit code, when the process exited on its own.
    #[inline]
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitOutcome::Exited(code) => Some(*code),
            ExitOutcome::Terminated => None,
        }
    }
}

/// Snapshot of what the runtime knows about one run.
#[derive(Clone, Debug)]
pub struct RunRecord {
    /// Identifier the run is registered under.
    pub id: RunId,
    /// Display name of the script.
    pub name: Arc<str>,
    /// Resolved script path.
    pub path: PathBuf,
    /// OS process id, available once the child has spawned.
    pub pid: Option<u32>,
    /// Wall-clock time the start request was accepted.
    pub started_at: SystemTime,
    /// Current lifecycle phase.
    pub status: RunStatus,
    /// Terminal outcome; `None` while the run is active.
    pub exit: Option<ExitOutcome>,
}

impl RunRecord {
    /// Creates the record for an accepted start request.
    pub fn new(spec: &RunSpec) -> Self {
        Self {
            id: spec.id().clone(),
            name: spec.name().into(),
            path: spec.path().to_path_buf(),
            pid: None,
            started_at: SystemTime::now(),
            status: RunStatus::Starting,
            exit: None,
        }
    }
}
