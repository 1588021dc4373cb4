//! Convergence executor — applies a plan in order, tracks changes and fires
//! notifications.
//!
//! Single pass, no reordering. An action that is the target of a
//! notification edge (and every service action) runs only after an earlier
//! action on one of its edges reported a change. A mandatory failure stops
//! the pass; what was already applied stays applied.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::error::{ActionError, ConvergeError};
use crate::guard::CommandGuard;
use crate::infrastructure::service::ServiceController;
use crate::infrastructure::{Change, HostBackend};
use crate::types::action::{ActionKind, ActionResult, Guard, PlannedAction, SkipReason};
use crate::types::platform::{ServiceSupports, ServiceVerb};

/// Outcome of a convergence execution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceResult {
    pub results: Vec<ActionResult>,
    /// Id of the mandatory action that stopped the pass.
    pub aborted_by: Option<String>,
}

impl ConvergenceResult {
    pub fn succeeded(&self) -> bool {
        self.aborted_by.is_none()
    }

    /// True when any action changed host state.
    pub fn changed(&self) -> bool {
        self.results.iter().any(|r| r.changed)
    }

    pub fn result(&self, action_id: &str) -> Option<&ActionResult> {
        self.results.iter().find(|r| r.action_id == action_id)
    }

    /// Turn an aborted pass into `ConvergeError::ActionFailed`.
    pub fn into_result(self) -> Result<Self, ConvergeError> {
        match &self.aborted_by {
            None => Ok(self),
            Some(action) => {
                let reason = self
                    .result(action)
                    .and_then(|r| r.error.clone())
                    .unwrap_or_default();
                Err(ConvergeError::ActionFailed {
                    action: action.clone(),
                    reason,
                })
            }
        }
    }
}

/// Executes a plan against a host backend, consulting the guard for
/// guarded actions and a service controller for service actions.
pub struct ConvergenceExecutor<'a> {
    guard: &'a dyn CommandGuard,
}

impl<'a> ConvergenceExecutor<'a> {
    pub fn new(guard: &'a dyn CommandGuard) -> Self {
        ConvergenceExecutor { guard }
    }

    pub fn execute(
        &self,
        plan: &[PlannedAction],
        host: &mut dyn HostBackend,
        mut services: Option<&mut (dyn ServiceController + '_)>,
    ) -> ConvergenceResult {
        let targets: HashSet<&str> = plan
            .iter()
            .flat_map(|a| a.notifies.iter().map(|n| n.target.as_str()))
            .collect();
        let mut fired: HashMap<&str, ServiceVerb> = HashMap::new();
        let mut results = Vec::with_capacity(plan.len());

        for action in plan {
            let id = action.id.as_str();

            if let Some(guard) = &action.guard {
                if !self.passes(guard) {
                    debug!(action = id, ?guard, "guard failed, skipping");
                    results.push(ActionResult::skipped(id, SkipReason::GuardFailed));
                    continue;
                }
            }

            let needs_notification =
                targets.contains(id) || matches!(action.kind, ActionKind::ControlService { .. });
            let verb = fired.get(id).copied();
            if needs_notification && verb.is_none() {
                debug!(action = id, "not notified, skipping");
                results.push(ActionResult::skipped(id, SkipReason::NotNotified));
                continue;
            }

            let outcome = match &action.kind {
                ActionKind::ControlService {
                    service_name,
                    supports,
                } => control_service(
                    services.as_deref_mut(),
                    service_name,
                    *supports,
                    verb.unwrap_or(ServiceVerb::Start),
                )
                .map(Change::from),
                kind => host.apply(kind),
            };

            match outcome {
                Ok(change) => {
                    match change {
                        Change::Contents => {
                            info!(action = id, kind = action.kind.label(), "changed");
                            for n in &action.notifies {
                                debug!(action = id, target = %n.target, verb = n.verb.as_str(), "notification fired");
                                fired.insert(n.target.as_str(), n.verb);
                            }
                        }
                        Change::Attributes => {
                            info!(action = id, kind = action.kind.label(), "attributes corrected, contents unchanged");
                        }
                        Change::Unchanged => debug!(action = id, "already converged"),
                    }
                    results.push(ActionResult::applied(id, change.is_changed()));
                }
                Err(e) if action.best_effort => {
                    warn!(action = id, error = %e, "best-effort action failed, continuing");
                    results.push(ActionResult::failed(id, e.to_string()));
                }
                Err(e) => {
                    error!(action = id, error = %e, "action failed, stopping run");
                    results.push(ActionResult::failed(id, e.to_string()));
                    return ConvergenceResult {
                        results,
                        aborted_by: Some(action.id.clone()),
                    };
                }
            }
        }

        ConvergenceResult {
            results,
            aborted_by: None,
        }
    }

    fn passes(&self, guard: &Guard) -> bool {
        match guard {
            Guard::CommandAvailable { command } => self.guard.available(command),
        }
    }
}

/// Fire the service with the notified verb. A restart of a stopped service
/// that can report status is issued as a start.
fn control_service(
    services: Option<&mut (dyn ServiceController + '_)>,
    name: &str,
    supports: ServiceSupports,
    verb: ServiceVerb,
) -> Result<bool, ActionError> {
    let Some(ctl) = services else {
        return Err(ActionError::Service {
            name: name.to_string(),
            message: "no service controller for this platform".into(),
        });
    };
    match verb {
        ServiceVerb::Start => ctl.start(name)?,
        ServiceVerb::Restart if supports.status && !ctl.status(name) => {
            debug!(service = name, "not running, starting instead of restarting");
            ctl.start(name)?
        }
        ServiceVerb::Restart => ctl.restart(name)?,
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::planner::{
        ActionPlanner, CLOUD_TAG, DOMAINNAME_COMMAND, HOSTNAME_COMMAND, HOSTNAME_FILE,
        HOSTNAME_SERVICE, HOSTS_ENTRY,
    };
    use crate::identity::resolve;
    use crate::infrastructure::mock::{MockGuard, RecordingController};
    use crate::platform::classify;
    use crate::types::identity::DesiredIdentity;

    /// Backend with scripted per-action outcomes. Unlisted actions report no change.
    #[derive(Default)]
    struct ScriptedHost {
        changed: HashSet<&'static str>,
        attrs_only: HashSet<&'static str>,
        failing: HashSet<&'static str>,
        applied: Vec<&'static str>,
    }

    impl HostBackend for ScriptedHost {
        fn apply(&mut self, action: &ActionKind) -> Result<Change, ActionError> {
            let label = action.label();
            self.applied.push(label);
            if self.failing.contains(label) {
                return Err(ActionError::Service {
                    name: label.to_string(),
                    message: "scripted failure".into(),
                });
            }
            if self.attrs_only.contains(label) {
                return Ok(Change::Attributes);
            }
            Ok(self.changed.contains(label).into())
        }
    }

    fn ubuntu_plan() -> Vec<PlannedAction> {
        let identity = resolve(&DesiredIdentity::new("db1", Some("corp.example".into()))).unwrap();
        ActionPlanner::new("10.0.0.5").plan(&identity, &classify("debian", "ubuntu"))
    }

    #[test]
    fn service_fires_when_hostname_file_changes() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost {
            changed: ["write_hostname_file"].into_iter().collect(),
            ..Default::default()
        };
        let mut ctl = RecordingController::running();
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, Some(&mut ctl));
        assert!(result.succeeded());
        assert_eq!(ctl.calls, vec!["restart hostname"]);
        assert!(result.result(HOSTNAME_SERVICE).unwrap().changed);
    }

    #[test]
    fn service_skipped_without_hostname_file_change() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost {
            changed: ["write_hosts_entry", "invoke_hostname_command"].into_iter().collect(),
            ..Default::default()
        };
        let mut ctl = RecordingController::running();
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, Some(&mut ctl));
        assert!(ctl.calls.is_empty());
        let service = result.result(HOSTNAME_SERVICE).unwrap();
        assert!(service.skipped);
        assert_eq!(service.skip_reason, Some(SkipReason::NotNotified));
    }

    #[test]
    fn attribute_only_fix_does_not_fire_service() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost {
            attrs_only: ["write_hostname_file"].into_iter().collect(),
            ..Default::default()
        };
        let mut ctl = RecordingController::running();
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, Some(&mut ctl));
        assert!(ctl.calls.is_empty());
        assert!(result.result(HOSTNAME_FILE).unwrap().changed);
        assert_eq!(
            result.result(HOSTNAME_SERVICE).unwrap().skip_reason,
            Some(SkipReason::NotNotified)
        );
    }

    #[test]
    fn restart_of_stopped_service_starts_it() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost {
            changed: ["write_hostname_file"].into_iter().collect(),
            ..Default::default()
        };
        let mut ctl = RecordingController::new();
        ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, Some(&mut ctl));
        assert_eq!(ctl.calls, vec!["start hostname"]);
    }

    #[test]
    fn guarded_actions_skip_when_command_absent() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost::default();
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, None);
        assert!(result.succeeded());
        for id in [DOMAINNAME_COMMAND, CLOUD_TAG] {
            let r = result.result(id).unwrap();
            assert!(r.skipped);
            assert_eq!(r.skip_reason, Some(SkipReason::GuardFailed));
        }
        assert!(!host.applied.contains(&"invoke_domainname_command"));
        assert!(!host.applied.contains(&"invoke_cloud_tag"));
    }

    #[test]
    fn guarded_actions_run_when_command_present() {
        let guard = MockGuard::with(&["domainname", "rs_tag"]);
        let mut host = ScriptedHost::default();
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, None);
        assert!(!result.result(DOMAINNAME_COMMAND).unwrap().skipped);
        assert!(host.applied.contains(&"invoke_domainname_command"));
        assert!(host.applied.contains(&"invoke_cloud_tag"));
    }

    #[test]
    fn mandatory_failure_stops_the_run() {
        let guard = MockGuard::with(&["domainname", "rs_tag"]);
        let mut host = ScriptedHost {
            changed: ["write_hosts_entry", "write_hostname_file"].into_iter().collect(),
            failing: ["invoke_hostname_command"].into_iter().collect(),
            ..Default::default()
        };
        let mut ctl = RecordingController::running();
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, Some(&mut ctl));
        assert_eq!(result.aborted_by.as_deref(), Some(HOSTNAME_COMMAND));
        assert_eq!(result.results.len(), 3);
        assert!(result.result(HOSTS_ENTRY).unwrap().changed);
        assert!(result.result(HOSTNAME_FILE).unwrap().changed);
        assert!(ctl.calls.is_empty());
        assert!(!host.applied.contains(&"invoke_domainname_command"));

        let err = result.into_result().unwrap_err();
        assert!(matches!(
            err,
            ConvergeError::ActionFailed { ref action, ref reason }
                if action == HOSTNAME_COMMAND && reason.contains("scripted failure")
        ));
    }

    #[test]
    fn best_effort_failure_does_not_stop_the_run() {
        let guard = MockGuard::with(&["domainname", "rs_tag"]);
        let mut host = ScriptedHost {
            failing: ["invoke_cloud_tag", "invoke_domainname_command"].into_iter().collect(),
            ..Default::default()
        };
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, None);
        assert!(result.succeeded());
        assert!(result.result(CLOUD_TAG).unwrap().error.is_some());
        assert!(result.result(DOMAINNAME_COMMAND).unwrap().error.is_some());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn service_failure_is_fatal() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost {
            changed: ["write_hostname_file"].into_iter().collect(),
            ..Default::default()
        };
        let mut ctl = RecordingController {
            running: true,
            fail: true,
            ..Default::default()
        };
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, Some(&mut ctl));
        assert_eq!(result.aborted_by.as_deref(), Some(HOSTNAME_SERVICE));
    }

    #[test]
    fn notified_service_without_controller_fails() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost {
            changed: ["write_hostname_file"].into_iter().collect(),
            ..Default::default()
        };
        let result = ConvergenceExecutor::new(&guard).execute(&ubuntu_plan(), &mut host, None);
        assert_eq!(result.aborted_by.as_deref(), Some(HOSTNAME_SERVICE));
    }

    #[test]
    fn unnotified_standalone_service_never_runs() {
        let guard = MockGuard::none();
        let plan = vec![PlannedAction::new(
            "svc",
            ActionKind::ControlService {
                service_name: "hostname".into(),
                supports: ServiceSupports::default(),
            },
        )];
        let mut host = ScriptedHost::default();
        let mut ctl = RecordingController::running();
        let result = ConvergenceExecutor::new(&guard).execute(&plan, &mut host, Some(&mut ctl));
        assert!(ctl.calls.is_empty());
        assert!(result.results[0].skipped);
    }

    #[test]
    fn results_follow_plan_order() {
        let guard = MockGuard::none();
        let mut host = ScriptedHost::default();
        let plan = ubuntu_plan();
        let result = ConvergenceExecutor::new(&guard).execute(&plan, &mut host, None);
        let ids: Vec<&str> = result.results.iter().map(|r| r.action_id.as_str()).collect();
        let planned: Vec<&str> = plan.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, planned);
        assert!(!result.changed());
    }
}
