//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for a [`Runner`](crate::Runner)
//! instance. Passed to [`Runner::builder`](crate::Runner::builder); every run
//! started by that runner inherits these settings.
//!
//! ## Sentinel values
//! - `log_capacity = 0` → unbounded per-run log retention
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use std::path::PathBuf;
use std::time::Duration;

/// Global configuration for the runner.
///
/// ## Field semantics
/// - `grace`: how long a stop request waits for the child to exit after the
///   graceful termination signal before escalating to a forced kill
/// - `bus_capacity`: event bus ring buffer size (shared by all receivers)
/// - `log_capacity`: per-run log ring size in lines (`0` = unbounded)
/// - `interpreter`: optional program the script path is passed to; `None`
///   executes the script directly (shebang / executable bit)
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for graceful exit before force-killing the child.
    ///
    /// When a stop is requested:
    /// - the child receives the platform's graceful termination signal
    /// - the supervisor waits up to `grace` for a natural exit
    /// - past the deadline the child is killed
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip the oldest items. Minimum value is 1 (enforced by
    /// the bus).
    pub bus_capacity: usize,

    /// Retention cap per run, in log lines.
    ///
    /// - `0` = unbounded (the original system's behavior)
    /// - `n > 0` = oldest lines are evicted once a run holds `n` lines
    pub log_capacity: usize,

    /// Program that script paths are handed to, e.g. a `python3` binary.
    ///
    /// `None` spawns the script path itself as the program.
    pub interpreter: Option<PathBuf>,
}

impl Config {
    /// Returns the per-run log cap as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` retained lines per run
    #[inline]
    pub fn log_capacity_limit(&self) -> Option<usize> {
        if self.log_capacity == 0 {
            None
        } else {
            Some(self.log_capacity)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 5s` (bounded stop window before the forced kill)
    /// - `bus_capacity = 1024`
    /// - `log_capacity = 10_000` lines per run
    /// - `interpreter = None` (scripts are executed directly)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            log_capacity: 10_000,
            interpreter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_capacity_zero_means_unbounded() {
        let mut cfg = Config::default();
        cfg.log_capacity = 0;
        assert_eq!(cfg.log_capacity_limit(), None);
        cfg.log_capacity = 7;
        assert_eq!(cfg.log_capacity_limit(), Some(7));
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let mut cfg = Config::default();
        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
