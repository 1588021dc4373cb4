//! The "set hostname" operation: resolve, classify, plan, execute, report.
//!
//! One `converge` call acts on the local host only. Two runs racing on the
//! same host are not coordinated; callers that may overlap must serialize
//! them (e.g. with `flock`) before calling in.

use serde::Serialize;
use tracing::{info, warn};

use crate::convergence::{ActionPlanner, ConvergenceExecutor};
use crate::error::ConvergeError;
use crate::guard::CommandGuard;
use crate::hostinfo::{self, HostFacts, HostSnapshot, FALLBACK_ADDRESS};
use crate::identity;
use crate::infrastructure::host::SystemHost;
use crate::infrastructure::runner::CommandRunner;
use crate::infrastructure::service::controller_for;
use crate::platform::{self, detect};
use crate::types::action::{ActionResult, PlannedAction};
use crate::types::config::Settings;
use crate::types::identity::{CanonicalIdentity, DesiredIdentity};
use crate::types::platform::PlatformProfile;

/// Everything computed before any action runs.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub identity: CanonicalIdentity,
    pub profile: PlatformProfile,
    pub actions: Vec<PlannedAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub identity: CanonicalIdentity,
    pub profile: PlatformProfile,
    pub results: Vec<ActionResult>,
    /// True when any action changed host state.
    pub updated: bool,
    pub previous: HostSnapshot,
    pub current: HostSnapshot,
}

pub struct Engine<'a> {
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
    guard: &'a dyn CommandGuard,
    facts: &'a dyn HostFacts,
}

impl<'a> Engine<'a> {
    pub fn new(
        settings: &'a Settings,
        runner: &'a dyn CommandRunner,
        guard: &'a dyn CommandGuard,
        facts: &'a dyn HostFacts,
    ) -> Self {
        Engine {
            settings,
            runner,
            guard,
            facts,
        }
    }

    /// The platform profile: the configured override, else os-release.
    /// Undetectable platforms classify as `other`.
    pub fn profile(&self) -> PlatformProfile {
        if let Some(p) = &self.settings.platform {
            return platform::classify(&p.family, &p.distribution);
        }
        match detect::detect() {
            Ok(d) => platform::classify(&d.family, &d.distribution),
            Err(e) => {
                warn!(error = %e, "platform not detected, treating as other");
                platform::classify("other", "unknown")
            }
        }
    }

    /// Address for the hosts entry: configured, detected, or the fallback.
    pub fn local_address(&self) -> String {
        self.settings
            .hosts_address
            .clone()
            .or_else(|| self.facts.local_address())
            .unwrap_or_else(|| FALLBACK_ADDRESS.to_string())
    }

    /// Resolve and plan without touching the host.
    pub fn plan(&self, desired: &DesiredIdentity) -> Result<Plan, ConvergeError> {
        let identity = identity::resolve(desired)?;
        let profile = self.profile();
        let actions = ActionPlanner::new(self.local_address()).plan(&identity, &profile);
        Ok(Plan {
            identity,
            profile,
            actions,
        })
    }

    /// Converge the host onto `desired`.
    pub fn converge(&self, desired: &DesiredIdentity) -> Result<RunReport, ConvergeError> {
        let Plan {
            identity,
            profile,
            actions,
        } = self.plan(desired)?;
        info!(
            fqdn = %identity.fqdn,
            family = profile.family.as_str(),
            distribution = %profile.distribution,
            actions = actions.len(),
            "converging host identity"
        );

        let previous = self.facts.snapshot();
        let mut host = SystemHost::new(self.settings, self.runner);
        let mut controller = controller_for(profile.service_backend, self.runner);

        let outcome = ConvergenceExecutor::new(self.guard)
            .execute(&actions, &mut host, controller.as_deref_mut())
            .into_result()?;

        let current = self.facts.snapshot();
        hostinfo::log_summary(&current, &previous.fqdn);

        Ok(RunReport {
            updated: outcome.changed(),
            results: outcome.results,
            identity,
            profile,
            previous,
            current,
        })
    }
}
