//! Typed errors for each pipeline stage.
//!
//! Every stage returns its own error type so callers can tell an acquisition
//! failure (possibly worth retrying) apart from a build failure (needs a fix
//! in the script). `RunError` is the umbrella the pipeline returns.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("script not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("`{command}` failed with {status}")]
    Git { command: String, status: ExitStatus },

    #[error("git is not available: {0}")]
    GitUnavailable(#[source] which::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to read script {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Directive {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to record state in {}: {source}", path.display())]
    State {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build tool `{tool}` not found: {source}")]
    ToolNotFound {
        tool: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with {status}")]
    Failed { command: String, status: ExitStatus },
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to link {} -> {}: {source}", alias.display(), target.display())]
    Link {
        alias: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with {status}")]
    Privileged { command: String, status: ExitStatus },
}

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("failed to execute {}: {source}", artifact.display())]
    Spawn {
        artifact: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for {}: {source}", artifact.display())]
    Wait {
        artifact: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
#[error("failed to lock {}: {source}", path.display())]
pub struct LockError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Any failure of a `swiftrun` run, tagged by stage.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

impl RunError {
    /// Stage name used in log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            RunError::Lock(_) => "lock",
            RunError::Acquire(_) => "acquire",
            RunError::Synthesis(_) => "synthesize",
            RunError::Build(_) => "build",
            RunError::Install(_) => "install",
            RunError::Handoff(_) => "handoff",
        }
    }
}
