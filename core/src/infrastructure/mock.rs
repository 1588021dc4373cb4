//! Test doubles for the engine's collaborators.
//!
//! Everything here records what it was asked to do and answers from
//! in-memory state, making it easy to write deterministic tests for the
//! planner, executor and engine without touching the real host.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::{ActionError, RunError};
use crate::guard::CommandGuard;
use crate::hostinfo::{HostFacts, HostSnapshot};
use crate::infrastructure::runner::CommandRunner;
use crate::infrastructure::service::ServiceController;

fn render_command(program: &str, args: &[&str]) -> String {
    let mut cmd = program.to_string();
    for arg in args {
        cmd.push(' ');
        cmd.push_str(arg);
    }
    cmd
}

fn failure(program: &str, message: String) -> RunError {
    RunError::Failed {
        program: program.to_string(),
        status: "exit status: 1".into(),
        stderr: message,
    }
}

// ---------------------------------------------------------------------------
// MockRunner
// ---------------------------------------------------------------------------

/// Test-double runner that records commands and returns pre-configured responses.
pub struct MockRunner {
    responses: RefCell<Vec<Result<String, String>>>,
    commands: RefCell<Vec<String>>,
}

impl MockRunner {
    pub fn with_responses(responses: Vec<Result<String, String>>) -> Self {
        let mut reversed = responses;
        reversed.reverse();
        MockRunner {
            responses: RefCell::new(reversed),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn new() -> Self {
        MockRunner {
            responses: RefCell::new(Vec::new()),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn executed_commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, RunError> {
        self.commands.borrow_mut().push(render_command(program, args));
        match self.responses.borrow_mut().pop() {
            Some(Ok(out)) => Ok(out),
            Some(Err(message)) => Err(failure(program, message)),
            None => Ok(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// SimulatedHost
// ---------------------------------------------------------------------------

/// A runner that behaves like the host's identity commands: `hostname`,
/// `domainname` and `rs_tag` read and write in-memory state. Service
/// commands succeed. Programs named in `fail` return an error.
pub struct SimulatedHost {
    hostname: RefCell<String>,
    domainname: RefCell<String>,
    tags: RefCell<Vec<String>>,
    fail: RefCell<HashSet<String>>,
    commands: RefCell<Vec<String>>,
}

impl SimulatedHost {
    pub fn new(hostname: &str) -> Self {
        SimulatedHost {
            hostname: RefCell::new(hostname.to_string()),
            domainname: RefCell::new(String::new()),
            tags: RefCell::new(Vec::new()),
            fail: RefCell::new(HashSet::new()),
            commands: RefCell::new(Vec::new()),
        }
    }

    /// Make every invocation of `program` fail.
    pub fn fail_program(&self, program: &str) {
        self.fail.borrow_mut().insert(program.to_string());
    }

    pub fn hostname(&self) -> String {
        self.hostname.borrow().clone()
    }

    pub fn domainname(&self) -> String {
        self.domainname.borrow().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().clone()
    }

    pub fn executed_commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }
}

impl CommandRunner for SimulatedHost {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, RunError> {
        self.commands.borrow_mut().push(render_command(program, args));
        if self.fail.borrow().contains(program) {
            return Err(failure(program, format!("{}: simulated failure", program)));
        }
        match (program, args) {
            ("hostname", []) => Ok(format!("{}\n", self.hostname.borrow())),
            ("hostname", [flag]) if flag.starts_with('-') => {
                let name = self.hostname.borrow();
                let (short, domain) = name.split_once('.').unwrap_or((name.as_str(), ""));
                Ok(match *flag {
                    "-f" => format!("{}\n", name),
                    "-s" => format!("{}\n", short),
                    "-d" => format!("{}\n", domain),
                    _ => "\n".into(),
                })
            }
            ("hostname", [name]) => {
                *self.hostname.borrow_mut() = name.to_string();
                Ok(String::new())
            }
            ("domainname", []) => {
                let d = self.domainname.borrow();
                Ok(if d.is_empty() { "(none)\n".into() } else { format!("{}\n", d) })
            }
            ("domainname", [name]) => {
                *self.domainname.borrow_mut() = name.to_string();
                Ok(String::new())
            }
            ("rs_tag", ["--list"]) => Ok(serde_json::to_string(&*self.tags.borrow()).unwrap_or_default()),
            ("rs_tag", ["--add", tag]) => {
                self.tags.borrow_mut().push(tag.to_string());
                Ok(String::new())
            }
            ("status", [name]) => Ok(format!("{} start/running\n", name)),
            _ => Ok(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Guard, service controller, host facts
// ---------------------------------------------------------------------------

/// Guard that reports a fixed set of commands as available.
#[derive(Debug, Default)]
pub struct MockGuard {
    available: HashSet<String>,
}

impl MockGuard {
    pub fn with(commands: &[&str]) -> Self {
        MockGuard {
            available: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl CommandGuard for MockGuard {
    fn available(&self, executable: &str) -> bool {
        self.available.contains(executable)
    }
}

/// Records service calls as `"<verb> <name>"`.
#[derive(Debug, Default)]
pub struct RecordingController {
    pub calls: Vec<String>,
    pub running: bool,
    pub fail: bool,
}

impl RecordingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running() -> Self {
        RecordingController {
            running: true,
            ..Self::default()
        }
    }

    fn record(&mut self, verb: &str, name: &str) -> Result<(), ActionError> {
        self.calls.push(format!("{} {}", verb, name));
        if self.fail {
            return Err(ActionError::Service {
                name: name.to_string(),
                message: format!("{} failed", verb),
            });
        }
        self.running = true;
        Ok(())
    }
}

impl ServiceController for RecordingController {
    fn start(&mut self, name: &str) -> Result<(), ActionError> {
        self.record("start", name)
    }

    fn restart(&mut self, name: &str) -> Result<(), ActionError> {
        self.record("restart", name)
    }

    fn status(&self, _name: &str) -> bool {
        self.running
    }
}

/// Host facts served from a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticFacts {
    pub snapshot: HostSnapshot,
    pub local_address: Option<String>,
}

impl HostFacts for StaticFacts {
    fn snapshot(&self) -> HostSnapshot {
        self.snapshot.clone()
    }

    fn local_address(&self) -> Option<String> {
        self.local_address.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_runner_records_commands() {
        let runner = MockRunner::with_responses(vec![Ok("ok".into()), Ok("ok2".into())]);
        assert!(runner.run("hostname", &[]).is_ok());
        assert!(runner.run("hostname", &["db1"]).is_ok());
        assert_eq!(runner.executed_commands(), vec!["hostname", "hostname db1"]);
    }

    #[test]
    fn mock_runner_returns_responses_in_order() {
        let runner = MockRunner::with_responses(vec![
            Ok("first".into()),
            Err("fail".into()),
            Ok("third".into()),
        ]);
        assert_eq!(runner.run("a", &[]).unwrap(), "first");
        assert!(matches!(runner.run("b", &[]), Err(RunError::Failed { .. })));
        assert_eq!(runner.run("c", &[]).unwrap(), "third");
        assert_eq!(runner.run("d", &[]).unwrap(), "");
    }

    #[test]
    fn simulated_host_tracks_identity() {
        let sim = SimulatedHost::new("localhost");
        sim.run("hostname", &["db1"]).unwrap();
        assert_eq!(sim.run("hostname", &[]).unwrap(), "db1\n");
        assert_eq!(sim.run("domainname", &[]).unwrap(), "(none)\n");
        sim.run("domainname", &["corp.example"]).unwrap();
        assert_eq!(sim.domainname(), "corp.example");
    }

    #[test]
    fn simulated_host_failures() {
        let sim = SimulatedHost::new("localhost");
        sim.fail_program("hostname");
        assert!(sim.run("hostname", &["db1"]).is_err());
        assert_eq!(sim.hostname(), "localhost");
    }

    #[test]
    fn mock_guard_answers_from_set() {
        let guard = MockGuard::with(&["domainname"]);
        assert!(guard.available("domainname"));
        assert!(!guard.available("rs_tag"));
        assert!(!MockGuard::none().available("domainname"));
    }
}
