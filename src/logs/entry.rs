//! # One timestamped, severity-tagged unit of captured output.

use std::sync::Arc;
use std::time::SystemTime;

/// Severity tag of a [`LogEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Supervisor-produced informational line (start notice, termination notice).
    Info,
    /// Line captured from the child's standard output.
    Stdout,
    /// Line captured from the child's standard error.
    Stderr,
    /// Terminal summary of a clean zero exit.
    Success,
    /// Terminal summary of a failed exit, or a supervision error.
    Error,
}

impl LogLevel {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Stdout => "stdout",
            LogLevel::Stderr => "stderr",
            LogLevel::Success => "success",
            LogLevel::Error => "error",
        }
    }
}

/// One captured line or supervisor notice.
///
/// Cheap to clone: the message is shared (`Arc<str>`), so the same entry can
/// sit in the log buffer and travel through the event bus without copying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Wall-clock capture time.
    pub at: SystemTime,
    /// Severity tag.
    pub level: LogLevel,
    /// The line text, without the trailing newline.
    pub message: Arc<str>,
}

impl LogEntry {
    /// Creates an entry stamped with the current wall-clock time.
    pub fn new(level: LogLevel, message: impl Into<Arc<str>>) -> Self {
        Self {
            at: SystemTime::now(),
            level,
            message: message.into(),
        }
    }

    /// Shorthand for an [`LogLevel::Info`] entry.
    #[inline]
    pub fn info(message: impl Into<Arc<str>>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Shorthand for an [`LogLevel::Error`] entry.
    #[inline]
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}
