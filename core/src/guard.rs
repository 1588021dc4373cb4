//! Command availability probes for guarded actions.
//!
//! Equivalent of `type -P <name>`: the search path is scanned for an
//! executable file, the command itself is never run. A missing command is an
//! ordinary answer, not an error.

use std::ffi::OsString;

use tracing::debug;

/// Answers whether an executable can be found on the search path.
pub trait CommandGuard {
    fn available(&self, executable: &str) -> bool;
}

/// Probes the process search path, or an explicit one when configured.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    search_path: Option<OsString>,
}

impl PathGuard {
    pub fn new() -> Self {
        PathGuard { search_path: None }
    }

    /// Probe `search_path` (colon separated) instead of `PATH`.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        PathGuard {
            search_path: Some(search_path.into()),
        }
    }
}

impl CommandGuard for PathGuard {
    fn available(&self, executable: &str) -> bool {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| "/".into());
                which::which_in(executable, Some(paths), cwd)
            }
            None => which::which(executable),
        };
        match found {
            Ok(path) => {
                debug!(executable, path = %path.display(), "command available");
                true
            }
            Err(_) => {
                debug!(executable, "command not found on search path");
                false
            }
        }
    }
}
