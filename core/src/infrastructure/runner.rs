//! Command runner abstraction for executing external programs.
//!
//! `CommandRunner` is the trait that backends use to execute system commands.
//! `ProcessRunner` is the production implementation: it spawns the program
//! directly (no shell, so arguments are never re-split or re-quoted) and kills
//! it if it outlives the configured timeout.

use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::RunError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const REAP_TIMEOUT: Duration = Duration::from_secs(2);
/// Bounds on collecting output after the child has exited. A daemon forked
/// by the child can keep the pipes open indefinitely.
const MIN_DRAIN: Duration = Duration::from_millis(50);
const MAX_DRAIN: Duration = Duration::from_secs(2);

/// Trait for executing a program with arguments, returning its stdout.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, RunError>;
}

/// Production runner that spawns the program with a wall-clock limit.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        ProcessRunner { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, RunError> {
        debug!(program, ?args, "running command");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    kill_and_reap(&mut child, program);
                    return Err(RunError::Timeout {
                        program: program.to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    kill_and_reap(&mut child, program);
                    return Err(RunError::Io {
                        program: program.to_string(),
                        source,
                    });
                }
            }
        };

        let drain_for = deadline
            .saturating_duration_since(Instant::now())
            .clamp(MIN_DRAIN, MAX_DRAIN);
        let until = Instant::now() + drain_for;
        let out = collect(stdout, until, program);
        let err = collect(stderr, until, program);
        if status.success() {
            Ok(out)
        } else {
            Err(RunError::Failed {
                program: program.to_string(),
                status: status.to_string(),
                stderr: err.trim().to_string(),
            })
        }
    }
}

/// Read the pipe on a thread, forwarding chunks. The channel closes at EOF.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut p| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match p.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });
        rx
    })
}

/// Gather forwarded output until EOF or `until`. A reader still blocked at
/// `until` is detached and the output read so far is returned.
fn collect(pipe: Option<Receiver<Vec<u8>>>, until: Instant, program: &str) -> String {
    let mut buf = Vec::new();
    if let Some(rx) = pipe {
        loop {
            match rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
                Ok(chunk) => buf.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    warn!(program, "output pipe held open after exit, detaching reader");
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Kill the child and wait a bounded time for it to exit. The pipe readers
/// unblock once the child's ends close; they are detached, not collected.
fn kill_and_reap(child: &mut Child, program: &str) {
    let _ = child.kill();
    let deadline = Instant::now() + REAP_TIMEOUT;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(_)) | Err(_) => return,
            Ok(None) => thread::sleep(POLL_INTERVAL),
        }
    }
    warn!(program, "child did not exit after kill");
}
