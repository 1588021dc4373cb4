//! Service control for the platform hostname service.
//!
//! The executor only needs start / restart / status; how the OS service
//! manager is driven is left to the implementation picked for the
//! platform's service backend.

use std::path::PathBuf;

use tracing::info;

use crate::error::ActionError;
use crate::infrastructure::runner::CommandRunner;
use crate::types::platform::ServiceBackend;

pub trait ServiceController {
    fn start(&mut self, name: &str) -> Result<(), ActionError>;
    fn restart(&mut self, name: &str) -> Result<(), ActionError>;
    /// True when the service reports itself running.
    fn status(&self, name: &str) -> bool;
}

fn service_error(name: &str, e: impl std::fmt::Display) -> ActionError {
    ActionError::Service {
        name: name.to_string(),
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// SysV init scripts
// ---------------------------------------------------------------------------

/// Drives `/etc/init.d/<name> <verb>`.
pub struct InitScriptController<'a> {
    runner: &'a dyn CommandRunner,
    init_dir: PathBuf,
}

impl<'a> InitScriptController<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        InitScriptController {
            runner,
            init_dir: PathBuf::from("/etc/init.d"),
        }
    }

    fn script(&self, name: &str) -> String {
        self.init_dir.join(name).to_string_lossy().into_owned()
    }

    fn invoke(&self, name: &str, verb: &str) -> Result<(), ActionError> {
        let script = self.script(name);
        self.runner
            .run(&script, &[verb])
            .map_err(|e| service_error(name, e))?;
        info!(service = name, verb, "init script invoked");
        Ok(())
    }
}

impl ServiceController for InitScriptController<'_> {
    fn start(&mut self, name: &str) -> Result<(), ActionError> {
        self.invoke(name, "start")
    }

    fn restart(&mut self, name: &str) -> Result<(), ActionError> {
        self.invoke(name, "restart")
    }

    fn status(&self, name: &str) -> bool {
        self.runner.run(&self.script(name), &["status"]).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Upstart
// ---------------------------------------------------------------------------

/// Drives the upstart `start` / `restart` / `status` commands.
pub struct UpstartController<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> UpstartController<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        UpstartController { runner }
    }

    fn invoke(&self, name: &str, verb: &str) -> Result<(), ActionError> {
        self.runner
            .run(verb, &[name])
            .map_err(|e| service_error(name, e))?;
        info!(service = name, verb, "upstart job invoked");
        Ok(())
    }
}

impl ServiceController for UpstartController<'_> {
    fn start(&mut self, name: &str) -> Result<(), ActionError> {
        self.invoke(name, "start")
    }

    fn restart(&mut self, name: &str) -> Result<(), ActionError> {
        self.invoke(name, "restart")
    }

    fn status(&self, name: &str) -> bool {
        // e.g. "hostname start/running" or "hostname stop/waiting"
        self.runner
            .run("status", &[name])
            .map(|out| out.contains("start/"))
            .unwrap_or(false)
    }
}

/// Pick the controller for a service backend. `None` has no controller.
pub fn controller_for<'a>(
    backend: ServiceBackend,
    runner: &'a dyn CommandRunner,
) -> Option<Box<dyn ServiceController + 'a>> {
    match backend {
        ServiceBackend::Init => Some(Box::new(InitScriptController::new(runner))),
        ServiceBackend::Upstart => Some(Box::new(UpstartController::new(runner))),
        ServiceBackend::None => None,
    }
}
