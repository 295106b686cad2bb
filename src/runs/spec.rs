//! # Run identity and launch description.
//!
//! [`RunId`] is the opaque key under which a run is registered; [`RunSpec`]
//! carries everything needed to launch the script: resolved path, display
//! name, arguments, environment and working directory.
//!
//! ## Identifier scheme
//! The id is the *canonicalized script path*. This keeps the invariant "same
//! script ⇒ same id" structural and makes collisions between distinct scripts
//! impossible, unlike truncated-hash schemes. Collaborators that already have
//! their own identifier scheme can use [`RunSpec::with_id`] instead.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opaque, stable identifier of one logical script.
///
/// Cheap to clone (`Arc<str>` internally). Two specs built from the same
/// resolved path always carry equal ids within and across process lifetimes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(Arc<str>);

impl RunId {
    /// Wraps an externally supplied identifier.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Derives the identifier from a script path by canonicalizing it.
    ///
    /// Fails when the path does not exist, which doubles as the first
    /// existence check of a start request.
    pub fn for_path(path: &Path) -> io::Result<Self> {
        let resolved = path.canonicalize()?;
        Ok(Self(resolved.to_string_lossy().into_owned().into()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Description of one script launch.
///
/// Immutable once built; the runner only reads it. Construction resolves the
/// path and derives the id, so a `RunSpec` always refers to a script that
/// existed at build time (the runner re-checks at start time).
#[derive(Clone, Debug)]
pub struct RunSpec {
    id: RunId,
    name: Arc<str>,
    path: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl RunSpec {
    /// Builds a spec from a script path, deriving the id from the
    /// canonicalized path.
    pub fn new(path: impl AsRef<Path>, name: impl Into<Arc<str>>) -> io::Result<Self> {
        let resolved = path.as_ref().canonicalize()?;
        let id = RunId(resolved.to_string_lossy().into_owned().into());
        Ok(Self {
            id,
            name: name.into(),
            path: resolved,
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        })
    }

    /// Builds a spec under an externally supplied identifier.
    ///
    /// The path is taken as already resolved; no filesystem access happens
    /// here. Intended for discovery collaborators with their own id scheme.
    pub fn with_id(id: RunId, name: impl Into<Arc<str>>, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    /// Appends arguments passed to the script.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable visible to the child process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the working directory of the child process.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Returns the run identifier.
    pub fn id(&self) -> &RunId {
        &self.id
    }

    /// Returns the human-readable display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resolved script path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the script arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the extra environment variables.
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Returns the working directory, if overridden.
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}
