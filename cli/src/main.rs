//! hostident CLI — the command-line entry point.
//!
//! # Usage
//!
//! ```text
//! hostident set db1 --domain corp.example
//! hostident plan db1 --domain corp.example
//! hostident show
//! hostident platform
//! hostident init-config --config /etc/hostident/config.yaml
//! ```

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use hostident_core::data;
use hostident_core::guard::PathGuard;
use hostident_core::hostinfo::{self, HostFacts, SystemFacts};
use hostident_core::infrastructure::runner::ProcessRunner;
use hostident_core::types::action::ActionResult;
use hostident_core::types::config::Settings;
use hostident_core::{DesiredIdentity, Engine, RunReport};

const DEFAULT_CONFIG_PATH: &str = "/etc/hostident/config.yaml";


#[derive(Parser, Debug)]
#[command(name = "hostident", version)]
#[command(about = "Converge this host's hostname, domain and FQDN", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Settings file (overrides $HOSTIDENT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set the host identity
    ///
    /// Runs are not coordinated with each other; serialize overlapping
    /// invocations on the same host (e.g. with flock).
    Set {
        /// Short hostname (no dots)
        short_hostname: String,
        /// DNS domain; the FQDN is the bare short name when omitted
        #[arg(long)]
        domain: Option<String>,
    },

    /// Print the planned actions as JSON without applying them
    Plan {
        short_hostname: String,
        #[arg(long)]
        domain: Option<String>,
    },

    /// Show what the host currently reports
    Show,

    /// Print the classified platform profile as JSON
    Platform,

    /// Write a settings file with every default filled in
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}


fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("hostident: {}", e);
        process::exit(1);
    }
}


fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("HOSTIDENT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}


fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = std::env::var("HOSTIDENT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}


fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(cli.config);
    if let Commands::InitConfig { force } = cli.command {
        init_config(&config_path, force)?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }
    debug!(path = %config_path.display(), "loading settings");
    let settings = data::load_or_default(&config_path)?;

    let runner = ProcessRunner::new(Duration::from_millis(settings.command_timeout_ms));
    let guard = build_guard(&settings);
    let facts = SystemFacts::new(&runner);
    let engine = Engine::new(&settings, &runner, &guard, &facts);

    match cli.command {
        Commands::Set {
            short_hostname,
            domain,
        } => {
            let report = engine.converge(&DesiredIdentity::new(&short_hostname, domain))?;
            for line in report_lines(&report) {
                println!("{}", line);
            }
        }
        Commands::Plan {
            short_hostname,
            domain,
        } => {
            let plan = engine.plan(&DesiredIdentity::new(&short_hostname, domain))?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Show => {
            let snapshot = facts.snapshot();
            for line in hostinfo::summary_lines(&snapshot, &snapshot.fqdn) {
                println!("{}", line);
            }
        }
        Commands::Platform => {
            println!("{}", serde_json::to_string_pretty(&engine.profile())?);
        }
        // Handled before the settings are loaded.
        Commands::InitConfig { .. } => {}
    }
    Ok(())
}


fn init_config(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists; pass --force to overwrite", path.display()).into());
    }
    data::save(path, &data::default_settings())?;
    Ok(())
}


fn build_guard(settings: &Settings) -> PathGuard {
    match &settings.search_path {
        Some(path) => PathGuard::with_search_path(path.as_str()),
        None => PathGuard::new(),
    }
}


fn result_status(result: &ActionResult) -> String {
    if let Some(error) = &result.error {
        return format!("failed ({})", error);
    }
    if result.skipped {
        return match &result.skip_reason {
            Some(reason) => format!("skipped ({:?})", reason),
            None => "skipped".into(),
        };
    }
    let status = if result.changed { "changed" } else { "unchanged" };
    status.into()
}


fn report_lines(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|r| format!("{:<20} {}", r.action_id, result_status(r)))
        .collect();
    lines.push(format!(
        "{} {}",
        report.identity.fqdn,
        if report.updated { "updated" } else { "already converged" }
    ));
    lines
}


#[cfg(test)]
mod tests {
    use super::*;
    use hostident_core::types::action::SkipReason;

    fn result(id: &str) -> ActionResult {
        ActionResult {
            action_id: id.into(),
            changed: false,
            skipped: false,
            skip_reason: None,
            error: None,
        }
    }

    #[test]
    fn resolve_config_path_prefers_flag() {
        let path = resolve_config_path(Some(PathBuf::from("/tmp/flag.yaml")));
        assert_eq!(path, PathBuf::from("/tmp/flag.yaml"));
    }

    #[test]
    fn resolve_config_path_env_then_default() {
        let old = std::env::var("HOSTIDENT_CONFIG").ok();

        std::env::set_var("HOSTIDENT_CONFIG", "/tmp/test-hostident.yaml");
        assert_eq!(resolve_config_path(None), PathBuf::from("/tmp/test-hostident.yaml"));

        std::env::remove_var("HOSTIDENT_CONFIG");
        assert_eq!(resolve_config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));

        if let Some(v) = old {
            std::env::set_var("HOSTIDENT_CONFIG", v);
        }
    }

    #[test]
    fn parses_set_with_domain() {
        let cli = Cli::try_parse_from(["hostident", "set", "db1", "--domain", "corp.example"]).unwrap();
        match cli.command {
            Commands::Set {
                short_hostname,
                domain,
            } => {
                assert_eq!(short_hostname, "db1");
                assert_eq!(domain.as_deref(), Some("corp.example"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hostident", "show", "-v", "--config", "/tmp/c.yaml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
    }

    #[test]
    fn set_requires_hostname() {
        assert!(Cli::try_parse_from(["hostident", "set"]).is_err());
    }

    #[test]
    fn init_config_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc/hostident/config.yaml");
        init_config(&path, false).unwrap();
        let loaded = data::load(&path).unwrap();
        assert_eq!(loaded.hosts_file, data::default_settings().hosts_file);
        assert_eq!(loaded.command_timeout_ms, 30_000);
    }

    #[test]
    fn init_config_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "command_timeout_ms: 5000\n").unwrap();
        let err = init_config(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(data::load(&path).unwrap().command_timeout_ms, 5000);

        init_config(&path, true).unwrap();
        assert_eq!(data::load(&path).unwrap().command_timeout_ms, 30_000);
    }

    #[test]
    fn status_text() {
        let mut r = result("hosts_entry");
        assert_eq!(result_status(&r), "unchanged");
        r.changed = true;
        assert_eq!(result_status(&r), "changed");
        r.skipped = true;
        r.skip_reason = Some(SkipReason::GuardFailed);
        assert_eq!(result_status(&r), "skipped (GuardFailed)");
        r.error = Some("boom".into());
        assert_eq!(result_status(&r), "failed (boom)");
    }

    #[test]
    fn guard_uses_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            search_path: Some(dir.path().to_string_lossy().into_owned()),
            ..Settings::default()
        };
        use hostident_core::guard::CommandGuard;
        assert!(!build_guard(&settings).available("sh"));
    }
}
