//! The production host backend: files from settings, commands through a
//! `CommandRunner`.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::ActionError;
use crate::infrastructure::files::{self, FileAttrs};
use crate::infrastructure::runner::CommandRunner;
use crate::infrastructure::{Change, HostBackend};
use crate::types::action::ActionKind;
use crate::types::config::Settings;

/// Value `domainname` prints when no domain is set.
const NO_DOMAIN: &str = "(none)";

pub struct SystemHost<'a> {
    hosts_file: PathBuf,
    hostname_file: PathBuf,
    network_config_file: PathBuf,
    hostname_attrs: FileAttrs,
    runner: &'a dyn CommandRunner,
}

impl<'a> SystemHost<'a> {
    pub fn new(settings: &Settings, runner: &'a dyn CommandRunner) -> Self {
        SystemHost {
            hosts_file: settings.hosts_file.clone(),
            hostname_file: settings.hostname_file.clone(),
            network_config_file: settings.network_config_file.clone(),
            hostname_attrs: FileAttrs {
                mode: Some(settings.hostname_file_mode),
                owner: settings.manage_ownership.then_some((0, 0)),
            },
            runner,
        }
    }

    fn write_hosts_entry(
        &self,
        address: &str,
        hostname: &str,
        aliases: &[String],
    ) -> Result<Change, ActionError> {
        let existing = files::read_optional(&self.hosts_file)?.unwrap_or_default();
        let rendered = files::render_hosts(&existing, address, hostname, aliases);
        Ok(files::write_if_changed(&self.hosts_file, &rendered, FileAttrs::default())?.into())
    }

    fn set_kernel_hostname(&self, fqdn: &str, edit_network_config: bool) -> Result<bool, ActionError> {
        let mut changed = false;
        if edit_network_config {
            changed |= files::edit_network_config(&self.network_config_file, fqdn)?;
        }

        let current = self.runner.run("hostname", &[])?;
        if current.trim() == fqdn {
            debug!(fqdn, "kernel hostname already set");
            return Ok(changed);
        }
        self.runner.run("hostname", &[fqdn])?;
        info!(from = current.trim(), to = fqdn, "kernel hostname set");
        Ok(true)
    }

    fn set_domainname(&self, domain: &str) -> Result<bool, ActionError> {
        let current = self.runner.run("domainname", &[])?;
        let current = match current.trim() {
            NO_DOMAIN => "",
            other => other,
        };
        if current == domain {
            debug!(domain, "domainname already set");
            return Ok(false);
        }
        // An absent domain only queries; an existing NIS domain is kept.
        if domain.is_empty() {
            debug!(current, "no domain requested, leaving domainname alone");
            return Ok(false);
        }
        self.runner.run("domainname", &[domain])?;
        info!(from = current, to = domain, "domainname set");
        Ok(true)
    }

    fn add_cloud_tag(&self, tag: &str) -> Result<bool, ActionError> {
        match self.runner.run("rs_tag", &["--list"]) {
            Ok(listing) if listed_tags(&listing).iter().any(|t| t == tag) => {
                debug!(tag, "cloud tag already present");
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "cannot list cloud tags, adding anyway"),
        }
        self.runner.run("rs_tag", &["--add", tag])?;
        info!(tag, "cloud tag added");
        Ok(true)
    }
}

/// Tags from `rs_tag --list`: a JSON array of strings, or one tag per line
/// when the output is not JSON.
fn listed_tags(listing: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(listing).unwrap_or_else(|_| {
        listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    })
}

impl HostBackend for SystemHost<'_> {
    fn apply(&mut self, action: &ActionKind) -> Result<Change, ActionError> {
        match action {
            ActionKind::WriteHostsEntry {
                address,
                hostname,
                aliases,
            } => self.write_hosts_entry(address, hostname, aliases),
            ActionKind::WriteHostnameFile { fqdn } => Ok(files::write_if_changed(
                &self.hostname_file,
                &format!("{}\n", fqdn),
                self.hostname_attrs,
            )?
            .into()),
            ActionKind::InvokeHostnameCommand {
                fqdn,
                edit_network_config,
            } => self.set_kernel_hostname(fqdn, *edit_network_config).map(Change::from),
            ActionKind::InvokeDomainnameCommand { domain } => self.set_domainname(domain).map(Change::from),
            ActionKind::InvokeCloudTag { tag } => self.add_cloud_tag(tag).map(Change::from),
            ActionKind::ControlService { service_name, .. } => Err(ActionError::Service {
                name: service_name.clone(),
                message: "service actions go through a service controller".into(),
            }),
        }
    }
}
