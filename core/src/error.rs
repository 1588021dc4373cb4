//! Error types for the convergence engine.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Process execution
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Per-action failures
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] RunError),

    #[error("service {name}: {message}")]
    Service { name: String, message: String },
}

impl ActionError {
    pub(crate) fn io(op: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        ActionError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_yaml::Error),
}

// ---------------------------------------------------------------------------
// Run level
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConvergeError {
    #[error("short hostname must not be empty")]
    EmptyHostname,

    #[error("short hostname '{0}' contains a domain separator; pass the domain separately")]
    DottedShortHostname(String),

    #[error("platform detection failed: {0}")]
    Detect(String),

    #[error("action {action} failed: {reason}")]
    ActionFailed { action: String, reason: String },
}
