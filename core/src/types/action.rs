use serde::{Deserialize, Serialize};

use crate::types::platform::{ServiceSupports, ServiceVerb};

/// What a planned action does. Payloads carry everything the host backend
/// needs; file locations come from settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    WriteHostsEntry {
        address: String,
        hostname: String,
        aliases: Vec<String>,
    },
    WriteHostnameFile {
        fqdn: String,
    },
    InvokeHostnameCommand {
        fqdn: String,
        /// Rewrite the `HOSTNAME=` line of the network config file as well.
        edit_network_config: bool,
    },
    InvokeDomainnameCommand {
        domain: String,
    },
    InvokeCloudTag {
        tag: String,
    },
    ControlService {
        service_name: String,
        supports: ServiceSupports,
    },
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::WriteHostsEntry { .. } => "write_hosts_entry",
            ActionKind::WriteHostnameFile { .. } => "write_hostname_file",
            ActionKind::InvokeHostnameCommand { .. } => "invoke_hostname_command",
            ActionKind::InvokeDomainnameCommand { .. } => "invoke_domainname_command",
            ActionKind::InvokeCloudTag { .. } => "invoke_cloud_tag",
            ActionKind::ControlService { .. } => "control_service",
        }
    }
}

/// Precondition evaluated before an action runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "guard", rename_all = "snake_case")]
pub enum Guard {
    /// The named executable must be on the search path.
    CommandAvailable { command: String },
}

/// Edge from an action to a downstream action that fires only on change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub target: String,
    pub verb: ServiceVerb,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannedAction {
    pub id: String,
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifies: Vec<Notification>,
    /// Failures are logged and the run continues.
    #[serde(default)]
    pub best_effort: bool,
}

impl PlannedAction {
    pub fn new(id: &str, kind: ActionKind) -> Self {
        PlannedAction {
            id: id.to_string(),
            kind,
            guard: None,
            notifies: Vec::new(),
            best_effort: false,
        }
    }

    pub fn guarded_by(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn notify(mut self, target: &str, verb: ServiceVerb) -> Self {
        self.notifies.push(Notification {
            target: target.to_string(),
            verb,
        });
        self
    }

    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    GuardFailed,
    NotNotified,
}

/// Outcome of one action within a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResult {
    pub action_id: String,
    pub changed: bool,
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn applied(action_id: &str, changed: bool) -> Self {
        ActionResult {
            action_id: action_id.to_string(),
            changed,
            skipped: false,
            skip_reason: None,
            error: None,
        }
    }

    pub fn skipped(action_id: &str, reason: SkipReason) -> Self {
        ActionResult {
            action_id: action_id.to_string(),
            changed: false,
            skipped: true,
            skip_reason: Some(reason),
            error: None,
        }
    }

    pub fn failed(action_id: &str, error: String) -> Self {
        ActionResult {
            action_id: action_id.to_string(),
            changed: false,
            skipped: false,
            skip_reason: None,
            error: Some(error),
        }
    }
}
