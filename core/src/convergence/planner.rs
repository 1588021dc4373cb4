//! Action planner — turns a canonical identity and a platform profile into
//! an ordered action list with notification edges.
//!
//! The planner is stateless apart from the local address it was built with.
//! It never executes anything itself.

use crate::types::action::{ActionKind, Guard, PlannedAction};
use crate::types::identity::CanonicalIdentity;
use crate::types::platform::{PlatformFamily, PlatformProfile};

pub const HOSTS_ENTRY: &str = "hosts_entry";
pub const HOSTNAME_FILE: &str = "hostname_file";
pub const HOSTNAME_COMMAND: &str = "hostname_command";
pub const HOSTNAME_SERVICE: &str = "hostname_service";
pub const DOMAINNAME_COMMAND: &str = "domainname_command";
pub const CLOUD_TAG: &str = "cloud_tag";

/// Tag registered with the cloud tagging tool.
pub fn cloud_tag(fqdn: &str) -> String {
    format!("node:hostname={}", fqdn)
}

#[derive(Debug, Clone)]
pub struct ActionPlanner {
    local_address: String,
}

impl ActionPlanner {
    /// `local_address` is the address the hosts entry maps to the FQDN.
    pub fn new(local_address: impl Into<String>) -> Self {
        ActionPlanner {
            local_address: local_address.into(),
        }
    }

    /// Build the plan.
    ///
    /// # Returns
    ///
    /// Actions in execution order:
    /// 1. Hosts entry
    /// 2. Hostname file (notifies the service when the platform has one)
    /// 3. Kernel hostname (plus the `HOSTNAME=` edit on redhat)
    /// 4. Hostname service, only when the platform has one
    /// 5. `domainname`, guarded
    /// 6. Cloud tag, guarded
    pub fn plan(&self, identity: &CanonicalIdentity, profile: &PlatformProfile) -> Vec<PlannedAction> {
        let mut actions = Vec::with_capacity(6);

        actions.push(PlannedAction::new(
            HOSTS_ENTRY,
            ActionKind::WriteHostsEntry {
                address: self.local_address.clone(),
                hostname: identity.fqdn.clone(),
                aliases: vec![identity.short_hostname.clone()],
            },
        ));

        let mut hostname_file = PlannedAction::new(
            HOSTNAME_FILE,
            ActionKind::WriteHostnameFile {
                fqdn: identity.fqdn.clone(),
            },
        );
        let service = match (&profile.service_name, profile.manages_service()) {
            (Some(name), true) => Some(name.clone()),
            _ => None,
        };
        if service.is_some() {
            hostname_file = hostname_file.notify(HOSTNAME_SERVICE, profile.start_action);
        }
        actions.push(hostname_file);

        actions.push(PlannedAction::new(
            HOSTNAME_COMMAND,
            ActionKind::InvokeHostnameCommand {
                fqdn: identity.fqdn.clone(),
                edit_network_config: profile.family == PlatformFamily::Redhat,
            },
        ));

        if let Some(service_name) = service {
            actions.push(PlannedAction::new(
                HOSTNAME_SERVICE,
                ActionKind::ControlService {
                    service_name,
                    supports: profile.service_supports,
                },
            ));
        }

        actions.push(
            PlannedAction::new(
                DOMAINNAME_COMMAND,
                ActionKind::InvokeDomainnameCommand {
                    domain: identity.domain_or_empty().to_string(),
                },
            )
            .guarded_by(Guard::CommandAvailable {
                command: "domainname".into(),
            })
            .best_effort(),
        );

        actions.push(
            PlannedAction::new(
                CLOUD_TAG,
                ActionKind::InvokeCloudTag {
                    tag: cloud_tag(&identity.fqdn),
                },
            )
            .guarded_by(Guard::CommandAvailable {
                command: "rs_tag".into(),
            })
            .best_effort(),
        );

        actions
    }
}
