//! Infrastructure backends for applying actions to the host.
//!
//! Provides the `HostBackend` trait, the production `SystemHost`, the
//! service controllers, the process runner, and mock implementations for
//! testing.

pub mod files;
pub mod host;
pub mod mock;
pub mod runner;
pub mod service;

use crate::error::ActionError;
use crate::types::action::ActionKind;

/// What applying an action did to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Unchanged,
    /// Only mode or ownership was corrected; contents were already right.
    Attributes,
    /// File contents or live host state changed.
    Contents,
}

impl Change {
    pub fn is_changed(self) -> bool {
        self != Change::Unchanged
    }

    /// Only content changes fire notifications.
    pub fn notifies(self) -> bool {
        self == Change::Contents
    }
}

impl From<bool> for Change {
    fn from(changed: bool) -> Self {
        if changed {
            Change::Contents
        } else {
            Change::Unchanged
        }
    }
}

impl From<files::WriteOutcome> for Change {
    fn from(outcome: files::WriteOutcome) -> Self {
        if outcome.content {
            Change::Contents
        } else if outcome.attrs {
            Change::Attributes
        } else {
            Change::Unchanged
        }
    }
}

/// Applies file and command actions to a host. Implementations compare
/// state before and after and report what changed.
pub trait HostBackend {
    fn apply(&mut self, action: &ActionKind) -> Result<Change, ActionError>;
}
