//! # RunSupervisor: owner of one child process.
//!
//! Supervises exactly one run: the child process handle, the two stream
//! reader tasks, and the wait/termination protocol.
//!
//! ## Event flow
//! ```text
//! start accepted ──► RunStarted
//!
//! per captured line (each stream independently):
//!   append to LogStore ──► publish RunLog
//!
//! terminal path (exactly once, all causes):
//!   summary entry (Success / Error / Info) ──► RunLog
//!   registry unregister                    ──► RunStopped
//! ```
//!
//! ## Termination protocol
//! ```text
//! cancel requested ──► graceful signal (SIGTERM)
//!        │
//!        ├─ child exits within grace ──► outcome from exit status
//!        └─ deadline exceeded        ──► forced kill ──► Terminated
//! ```
//!
//! ## Rules
//! - Within one stream, entries keep the exact order produced; interleaving
//!   across the two streams is best-effort.
//! - Reader tasks are joined before the summary entry, with a bounded drain:
//!   a pipe held open by an orphaned grandchild cannot stall retirement.
//! - The registry removal is the linearization point for `RunStopped`, so a
//!   stop racing a natural exit never double-publishes.
//! - A supervision fault (wait error, kill error, read error) becomes an
//!   `Error` log entry and the run is still retired, never left stuck in
//!   the registry.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinSet;
use tokio::time;

use crate::events::{Bus, Event};
use crate::logs::{LogEntry, LogLevel, LogStore};
use crate::runs::{ExitOutcome, RunId, RunSpec};

use super::proc;
use super::registry::{RunHandle, RunRegistry};

/// How long retirement waits for the reader tasks after the child is gone.
///
/// Normally the pipes close with the process and the drain is instant; the
/// bound only matters when an orphaned grandchild inherited the write end.
const READER_DRAIN: Duration = Duration::from_secs(1);

/// Supervises one run from spawned child to retirement.
pub(crate) struct RunSupervisor {
    spec: RunSpec,
    handle: Arc<RunHandle>,
    registry: Arc<RunRegistry>,
    logs: Arc<LogStore>,
    bus: Bus,
    grace: Duration,
}

impl RunSupervisor {
    pub(crate) fn new(
        spec: RunSpec,
        handle: Arc<RunHandle>,
        registry: Arc<RunRegistry>,
        logs: Arc<LogStore>,
        bus: Bus,
        grace: Duration,
    ) -> Self {
        Self {
            spec,
            handle,
            registry,
            logs,
            bus,
            grace,
        }
    }

    /// Drives the run to completion.
    ///
    /// Returns `Err` only when the kill signal itself failed; the run is
    /// retired either way.
    pub(crate) async fn run(self, mut child: Child) -> io::Result<()> {
        let id = self.spec.id().clone();

        let mut readers = JoinSet::new();
        if let Some(stdout) = child.stdout.take() {
            readers.spawn(pump_stream(
                stdout,
                LogLevel::Stdout,
                id.clone(),
                Arc::clone(&self.logs),
                self.bus.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.spawn(pump_stream(
                stderr,
                LogLevel::Stderr,
                id.clone(),
                Arc::clone(&self.logs),
                self.bus.clone(),
            ));
        }

        let cancel = self.handle.cancel_token();
        let mut termination_failure: Option<io::Error> = None;

        let outcome = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => outcome_of(status),
                Err(err) => {
                    self.record_fault(format!("failed to observe process exit: {err}")).await;
                    ExitOutcome::Terminated
                }
            },
            _ = cancel.cancelled() => {
                self.handle.set_stopping().await;
                match self.terminate(&mut child).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        self.record_fault(format!("failed to terminate process: {err}")).await;
                        termination_failure = Some(err);
                        ExitOutcome::Terminated
                    }
                }
            }
        };

        self.drain_readers(&mut readers).await;
        self.finish(outcome).await;

        match termination_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Graceful signal, bounded wait, forced kill past the deadline.
    async fn terminate(&self, child: &mut Child) -> io::Result<ExitOutcome> {
        proc::signal_term(child)?;

        match time::timeout(self.grace, child.wait()).await {
            Ok(status) => Ok(outcome_of(status?)),
            Err(_elapsed) => {
                tracing::debug!(
                    target: "runvisor.proc",
                    run = %self.spec.id(),
                    grace = ?self.grace,
                    "grace exceeded; killing child"
                );
                child.kill().await?;
                Ok(ExitOutcome::Terminated)
            }
        }
    }

    /// Joins the reader tasks, aborting stragglers past [`READER_DRAIN`].
    async fn drain_readers(&self, readers: &mut JoinSet<()>) {
        let drained = time::timeout(READER_DRAIN, async {
            while readers.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            readers.abort_all();
            while readers.join_next().await.is_some() {}
        }
    }

    /// Summary entry, terminal record state, registry removal, `RunStopped`.
    async fn finish(&self, outcome: ExitOutcome) {
        let id = self.spec.id();

        let summary = match outcome {
            ExitOutcome::Exited(0) => LogEntry::new(LogLevel::Success, "completed successfully"),
            ExitOutcome::Exited(code) => LogEntry::error(format!("exited with code {code}")),
            ExitOutcome::Terminated => LogEntry::info("terminated by signal"),
        };
        self.logs.append(id, summary.clone()).await;
        self.bus.publish(Event::run_log(id, summary));

        self.handle.set_terminated(outcome).await;
        if self.registry.unregister(id).await.is_some() {
            self.bus.publish(Event::run_stopped(id, outcome));
        }

        tracing::debug!(target: "runvisor.core", run = %id, ?outcome, "run retired");
    }

    /// Records a supervision fault in the run's log.
    async fn record_fault(&self, detail: String) {
        let entry = LogEntry::error(detail);
        self.logs.append(self.spec.id(), entry.clone()).await;
        self.bus.publish(Event::run_log(self.spec.id(), entry));
    }
}

/// Reads one stream line-by-line until end-of-stream, appending and
/// publishing every non-empty line.
async fn pump_stream<R>(stream: R, level: LogLevel, id: RunId, logs: Arc<LogStore>, bus: Bus)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                let entry = LogEntry::new(level, line);
                logs.append(&id, entry.clone()).await;
                bus.publish(Event::run_log(&id, entry));
            }
            Ok(None) => break,
            Err(err) => {
                let entry = LogEntry::error(format!("{} read failed: {err}", level.as_label()));
                logs.append(&id, entry.clone()).await;
                bus.publish(Event::run_log(&id, entry));
                break;
            }
        }
    }
    tracing::trace!(target: "runvisor.proc", run = %id, stream = level.as_label(), "stream closed");
}

fn outcome_of(status: ExitStatus) -> ExitOutcome {
    match status.code() {
        Some(code) => ExitOutcome::Exited(code),
        None => ExitOutcome::Terminated,
    }
}
