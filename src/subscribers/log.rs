//! # Simple stdout subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events in a human-readable format. Enabled via the
//! `logging` feature; production observers should implement [`Subscribe`]
//! themselves (structured logging, sockets, metrics).
//!
//! ## Output format
//! ```text
//! [started] run=/opt/scripts/backup.sh
//! [log] run=/opt/scripts/backup.sh stdout: syncing...
//! [stopped] run=/opt/scripts/backup.sh exit=0
//! [overflow] subscriber=websocket reason=full
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Stdout logging subscriber.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::RunStarted => {
                if let Some(run) = &e.run {
                    println!("[started] run={run}");
                }
            }
            EventKind::RunLog => {
                if let (Some(run), Some(entry)) = (&e.run, &e.entry) {
                    println!("[log] run={run} {}: {}", entry.level.as_label(), entry.message);
                }
            }
            EventKind::RunStopped => {
                if let Some(run) = &e.run {
                    match e.exit.and_then(|exit| exit.code()) {
                        Some(code) => println!("[stopped] run={run} exit={code}"),
                        None => println!("[stopped] run={run} exit=signal"),
                    }
                }
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[overflow] subscriber={:?} reason={:?}",
                    e.run, e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!("[panic] subscriber={:?} info={:?}", e.run, e.reason);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStopped => {
                println!("[all-stopped]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
