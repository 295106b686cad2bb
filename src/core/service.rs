//! # Runner: the composition root.
//!
//! [`Runner`] accepts start/stop requests, enforces one-run-per-identifier,
//! creates supervisors and wires them to the event bus, the log store and
//! the registry. All state lives in the instance; dropping the runner drops
//! the registries with it.
//!
//! ## Start flow
//! ```text
//! start_run(spec)
//!   ├─► path exists?              ── no ──► Err(NotFound)
//!   ├─► registry.try_register     ── no ──► Err(AlreadyRunning)
//!   ├─► spawn child process       ── err ─► unregister, Err(Spawn)
//!   ├─► publish RunStarted, append "starting <name>" entry
//!   └─► spawn RunSupervisor task, bind its JoinHandle into the registry
//! ```
//!
//! ## Stop flow
//! ```text
//! stop_run(id)
//!   ├─► registry.get              ── none ─► Err(NotRunning)
//!   ├─► take JoinHandle, cancel the run's token
//!   └─► await the supervisor (graceful signal → grace → forced kill)
//! ```

use std::io;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::error::{StartError, StopError};
use crate::events::{Bus, Event, EventKind};
use crate::logs::{LogEntry, LogStore};
use crate::runs::{ExitOutcome, RunId, RunRecord, RunSpec};

use super::builder::RunnerBuilder;
use super::proc;
use super::registry::{RunHandle, RunRegistry};
use super::shutdown;
use super::supervisor::RunSupervisor;

/// Supervises script runs: starts children, streams their output, stops them.
///
/// Cheap to share (`Arc` from the builder); safe under concurrent start/stop
/// requests.
pub struct Runner {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    pub(crate) registry: Arc<RunRegistry>,
    pub(crate) logs: Arc<LogStore>,
}

impl Runner {
    /// Returns a builder for a runner with the given configuration.
    pub fn builder(cfg: Config) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    /// Starts a run for the spec.
    ///
    /// On success the run is registered, `RunStarted` has been published and
    /// the supervisor task owns the child. Errors mean nothing was started:
    /// no registry entry, no events.
    pub async fn start_run(&self, spec: RunSpec) -> Result<(), StartError> {
        let id = spec.id().clone();

        if !tokio::fs::try_exists(spec.path()).await.unwrap_or(false) {
            return Err(StartError::NotFound {
                path: spec.path().to_path_buf(),
            });
        }

        let handle = Arc::new(RunHandle::new(RunRecord::new(&spec)));
        if !self.registry.try_register(&id, Arc::clone(&handle)).await {
            return Err(StartError::AlreadyRunning { id });
        }

        let child = match proc::spawn(&spec, self.cfg.interpreter.as_deref()) {
            Ok(child) => child,
            Err(source) => {
                self.registry.unregister(&id).await;
                return Err(StartError::Spawn { source });
            }
        };

        tracing::debug!(
            target: "runvisor.core",
            run = %id,
            pid = child.id(),
            path = %spec.path().display(),
            "child process spawned"
        );

        // Fresh history for the identifier; the previous run's log is
        // replaced, never mixed into.
        self.logs.reset(&id).await;
        handle.set_running(child.id()).await;
        self.bus.publish(Event::run_started(&id));

        let starting = LogEntry::info(format!("starting {}", spec.name()));
        self.logs.append(&id, starting.clone()).await;
        self.bus.publish(Event::run_log(&id, starting));

        let supervisor = RunSupervisor::new(
            spec,
            Arc::clone(&handle),
            Arc::clone(&self.registry),
            Arc::clone(&self.logs),
            self.bus.clone(),
            self.cfg.grace,
        );
        let join = tokio::spawn(supervisor.run(child));
        handle.bind_join(join).await;

        Ok(())
    }

    /// Stops an active run: graceful signal, bounded wait, forced kill.
    ///
    /// Returns once the run is fully retired (`RunStopped` published). A run
    /// that already terminated, or was never started, yields
    /// [`StopError::NotRunning`].
    pub async fn stop_run(&self, id: &RunId) -> Result<(), StopError> {
        let handle = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| StopError::NotRunning { id: id.clone() })?;

        let join = handle.take_join().await;
        handle.cancel();

        let Some(join) = join else {
            // Another stop is already driving termination; the cancel above
            // is enough.
            return Ok(());
        };

        match join.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(StopError::Termination {
                detail: err.to_string(),
            }),
            Err(join_err) => {
                // The supervisor task died. Retire the run here so it cannot
                // stay stuck in the registry.
                let entry = LogEntry::error(format!("supervisor task failed: {join_err}"));
                self.logs.append(id, entry.clone()).await;
                self.bus.publish(Event::run_log(id, entry));
                if self.registry.unregister(id).await.is_some() {
                    self.bus
                        .publish(Event::run_stopped(id, ExitOutcome::Terminated));
                }
                Ok(())
            }
        }
    }

    /// Returns the ordered log history of a run, empty for unknown ids.
    pub async fn get_logs(&self, id: &RunId) -> Vec<LogEntry> {
        self.logs.read(id).await
    }

    /// Returns a sorted snapshot of currently active run identifiers.
    pub async fn list_running(&self) -> Vec<RunId> {
        self.registry.list_active().await
    }

    /// Returns a snapshot of every active run's record.
    pub async fn snapshot(&self) -> Vec<RunRecord> {
        self.registry.snapshot().await
    }

    /// Returns true when the identifier has an active run.
    pub async fn is_running(&self, id: &RunId) -> bool {
        match self.registry.get(id).await {
            Some(handle) => handle.record().await.status.is_active(),
            None => false,
        }
    }

    /// Creates a new receiver of lifecycle events.
    ///
    /// Only events published after this call are observed; history is served
    /// by [`Runner::get_logs`], not the bus.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops every active run and waits for all of them to retire.
    ///
    /// Publishes `ShutdownRequested` first and `AllStopped` once done. Each
    /// run goes through the normal graceful-then-forced protocol, so the
    /// wait is bounded by the configured grace.
    pub async fn shutdown(&self) {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));

        let handles = self.registry.active_handles().await;
        for (_, handle) in &handles {
            handle.cancel();
        }
        for (id, handle) in handles {
            if let Some(join) = handle.take_join().await {
                if join.await.is_err() {
                    // Dead supervisor: retire the run here, same as stop_run.
                    if self.registry.unregister(&id).await.is_some() {
                        self.bus
                            .publish(Event::run_stopped(&id, ExitOutcome::Terminated));
                    }
                }
            }
        }

        self.bus.publish(Event::new(EventKind::AllStopped));
    }

    /// Waits for an OS termination signal, then [`Runner::shutdown`]s.
    pub async fn run_until_signal(&self) -> io::Result<()> {
        shutdown::wait_for_shutdown_signal().await?;
        self.shutdown().await;
        Ok(())
    }
}
