use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Overrides platform detection when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformOverride {
    pub family: String,
    #[serde(default)]
    pub distribution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub version: String,
    pub hosts_file: PathBuf,
    pub hostname_file: PathBuf,
    /// Shared network configuration file on redhat-family hosts.
    pub network_config_file: PathBuf,
    pub hostname_file_mode: u32,
    /// Chown the hostname file to root:root.
    pub manage_ownership: bool,
    /// Address for the hosts entry. Detected when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformOverride>,
    pub command_timeout_ms: u64,
    /// Replaces `PATH` for command availability probes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        crate::data::settings::default_settings()
    }
}
