//! # Child process plumbing.
//!
//! Builds the [`tokio::process::Command`] for a run and implements the two
//! halves of the termination protocol: the graceful signal and the forced
//! kill fallback.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::runs::RunSpec;

/// Spawns the child process for a spec.
///
/// Both output streams are piped; stdin is closed. `kill_on_drop` backstops
/// supervisor failure: a dropped child never outlives the runtime.
pub(crate) fn spawn(spec: &RunSpec, interpreter: Option<&std::path::Path>) -> io::Result<Child> {
    let mut cmd = match interpreter {
        Some(program) => {
            let mut c = Command::new(program);
            c.arg(spec.path());
            c
        }
        None => Command::new(spec.path()),
    };
    cmd.args(spec.args());
    for (key, value) in spec.env() {
        cmd.env(key, value);
    }
    if let Some(cwd) = spec.cwd() {
        cmd.current_dir(cwd);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd.spawn()
}

/// Sends the platform's graceful termination signal (SIGTERM on unix).
///
/// A child that already exited is not an error.
#[cfg(unix)]
pub(crate) fn signal_term(child: &mut Child) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from_raw_os_error(errno as i32)),
    }
}

/// Sends the platform's graceful termination signal.
///
/// Without a gentler mechanism on this platform, begins a kill immediately;
/// the supervisor's bounded wait then reaps the child.
#[cfg(not(unix))]
pub(crate) fn signal_term(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}
