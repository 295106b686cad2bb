//! # Run registry - the single source of truth for "is this running".
//!
//! Maps run identifiers to their active [`RunHandle`]s. Owned by the
//! [`Runner`](crate::Runner) instance (no ambient/static state) and shared
//! by reference with the supervisors, which unregister themselves on exit.
//!
//! ## Rules
//! - `try_register` is a single atomic compare-and-insert: two concurrent
//!   start requests for one identifier cannot both succeed.
//! - `unregister` is idempotent; removing an absent identifier is a no-op.
//!   Its `Option` return is the linearization point for the terminal event:
//!   only the caller that actually removed the handle publishes `RunStopped`.
//! - The registry owns each run's `CancellationToken` and `JoinHandle`, so
//!   stop and shutdown paths can cancel and then join deterministically.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::runs::{ExitOutcome, RunId, RunRecord, RunStatus};

/// Handle to one active run.
///
/// The record inside is single-writer (the owning supervisor); everyone else
/// takes cloned snapshots.
pub(crate) struct RunHandle {
    record: RwLock<RunRecord>,
    cancel: CancellationToken,
    join: Mutex<Option<JoinHandle<io::Result<()>>>>,
}

impl RunHandle {
    pub(crate) fn new(record: RunRecord) -> Self {
        Self {
            record: RwLock::new(record),
            cancel: CancellationToken::new(),
            join: Mutex::new(None),
        }
    }

    /// Requests cooperative termination of the run.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a clone of the run's cancellation token.
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stores the supervisor task handle. Called once, right after spawn.
    pub(crate) async fn bind_join(&self, join: JoinHandle<io::Result<()>>) {
        *self.join.lock().await = Some(join);
    }

    /// Takes the supervisor task handle, leaving `None` for later callers.
    pub(crate) async fn take_join(&self) -> Option<JoinHandle<io::Result<()>>> {
        self.join.lock().await.take()
    }

    /// Returns a snapshot of the run record.
    pub(crate) async fn record(&self) -> RunRecord {
        self.record.read().await.clone()
    }

    /// Marks the run as running with the spawned child's pid.
    pub(crate) async fn set_running(&self, pid: Option<u32>) {
        let mut record = self.record.write().await;
        record.status = RunStatus::Running;
        record.pid = pid;
    }

    /// Marks the run as stopping (termination protocol in progress).
    pub(crate) async fn set_stopping(&self) {
        self.record.write().await.status = RunStatus::Stopping;
    }

    /// Marks the run as terminated with its outcome. Absorbing.
    pub(crate) async fn set_terminated(&self, exit: ExitOutcome) {
        let mut record = self.record.write().await;
        record.status = RunStatus::Terminated;
        record.exit = Some(exit);
    }
}

/// Concurrent-safe mapping from identifier to active run handle.
pub(crate) struct RunRegistry {
    runs: RwLock<HashMap<RunId, Arc<RunHandle>>>,
}

impl RunRegistry {
    pub(crate) fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Atomically inserts the handle if the identifier is free.
    ///
    /// Returns `false` without mutation when an active run already holds the
    /// identifier.
    pub(crate) async fn try_register(&self, id: &RunId, handle: Arc<RunHandle>) -> bool {
        let mut runs = self.runs.write().await;
        if runs.contains_key(id) {
            return false;
        }
        runs.insert(id.clone(), handle);
        true
    }

    /// Removes and returns the handle. Idempotent: absent ids yield `None`.
    pub(crate) async fn unregister(&self, id: &RunId) -> Option<Arc<RunHandle>> {
        self.runs.write().await.remove(id)
    }

    /// Returns the handle without removing it.
    pub(crate) async fn get(&self, id: &RunId) -> Option<Arc<RunHandle>> {
        self.runs.read().await.get(id).cloned()
    }

    /// Returns a sorted snapshot of active identifiers.
    pub(crate) async fn list_active(&self) -> Vec<RunId> {
        let runs = self.runs.read().await;
        let mut ids: Vec<RunId> = runs.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns a snapshot of every active run's record.
    pub(crate) async fn snapshot(&self) -> Vec<RunRecord> {
        let handles: Vec<Arc<RunHandle>> = {
            let runs = self.runs.read().await;
            runs.values().cloned().collect()
        };
        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            records.push(handle.record().await);
        }
        records.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Returns every active handle, for the shutdown path.
    pub(crate) async fn active_handles(&self) -> Vec<(RunId, Arc<RunHandle>)> {
        let runs = self.runs.read().await;
        runs.iter().map(|(id, h)| (id.clone(), Arc::clone(h))).collect()
    }
}
