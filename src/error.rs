//! Error types returned by the runner control plane.
//!
//! This module defines two error enums:
//!
//! - [`StartError`]: a start request was rejected before the run became active.
//! - [`StopError`]: a stop request could not retire the run.
//!
//! Both types provide `as_label()` for logging/metrics. Failures that happen
//! *after* a run is active (read errors, non-zero exits) are never surfaced
//! through these types: they are recorded as log entries and published on the
//! event bus, because the original request has already completed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::runs::RunId;

/// # Errors rejecting a start request.
///
/// Returned synchronously by [`Runner::start_run`](crate::Runner::start_run).
/// When any of these is returned, no `RunStarted` event has been published and
/// the registry holds no entry for the identifier.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartError {
    /// The script path does not exist (or is not readable) at call time.
    #[error("script path does not exist: {}", path.display())]
    NotFound {
        /// The path that failed the existence check.
        path: PathBuf,
    },

    /// An active run already holds this identifier.
    #[error("run already active: {id}")]
    AlreadyRunning {
        /// The contested identifier.
        id: RunId,
    },

    /// The child process could not be created (missing interpreter,
    /// permission denied, ...). Carries the underlying OS error.
    #[error("failed to spawn child process: {source}")]
    Spawn {
        /// The OS-level spawn failure.
        #[source]
        source: io::Error,
    },
}

impl StartError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::NotFound { .. } => "start_not_found",
            StartError::AlreadyRunning { .. } => "start_already_running",
            StartError::Spawn { .. } => "start_spawn_failure",
        }
    }
}

/// # Errors rejecting a stop request.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StopError {
    /// No active run holds this identifier. Also returned when a previous
    /// stop or a natural exit already retired the run.
    #[error("no active run: {id}")]
    NotRunning {
        /// The unknown identifier.
        id: RunId,
    },

    /// The kill signal itself failed. Rare; the run is still retired and the
    /// failure is additionally recorded in the run's log.
    #[error("failed to terminate child process: {detail}")]
    Termination {
        /// Description of the underlying kill failure.
        detail: String,
    },
}

impl StopError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopError::NotRunning { .. } => "stop_not_running",
            StopError::Termination { .. } => "stop_termination_failure",
        }
    }
}
