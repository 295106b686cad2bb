//! # Per-run append-only log buffer.
//!
//! [`LogStore`] keeps one ordered sequence of [`LogEntry`] values per run
//! identifier, readable at any time during or after the run.
//!
//! ## Rules
//! - Append is O(1) amortized; readers never observe a gap or a reorder:
//!   a concurrent read returns a strict prefix of the eventual full log.
//! - Retention is bounded per run (ring eviction of the oldest lines) when a
//!   capacity is configured; `None` keeps everything for the run's lifetime.
//! - A run's history survives its termination and is replaced wholesale when
//!   a new run starts under the same identifier.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use crate::logs::LogEntry;
use crate::runs::RunId;

/// Thread-safe map of run identifier → ordered log history.
pub struct LogStore {
    runs: RwLock<HashMap<RunId, VecDeque<LogEntry>>>,
    capacity: Option<usize>,
}

impl LogStore {
    /// Creates a store with the given per-run retention cap
    /// (`None` = unbounded).
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            capacity: capacity.filter(|cap| *cap > 0),
        }
    }

    /// Appends one entry to a run's history, evicting the oldest line when
    /// the run is at capacity.
    pub async fn append(&self, id: &RunId, entry: LogEntry) {
        let mut runs = self.runs.write().await;
        let log = runs.entry(id.clone()).or_default();
        log.push_back(entry);
        if let Some(cap) = self.capacity {
            while log.len() > cap {
                log.pop_front();
            }
        }
    }

    /// Returns a snapshot of a run's history, oldest first.
    ///
    /// Unknown identifiers yield an empty sequence, not an error.
    pub async fn read(&self, id: &RunId) -> Vec<LogEntry> {
        let runs = self.runs.read().await;
        runs.get(id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Discards any previous history for the identifier.
    ///
    /// Called when a new run starts under an identifier, so readers never mix
    /// two runs' output.
    pub async fn reset(&self, id: &RunId) {
        let mut runs = self.runs.write().await;
        runs.insert(id.clone(), VecDeque::new());
    }

}
