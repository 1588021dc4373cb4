use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SettingsError;
use crate::types::config::Settings;

/// The current settings version. Bump this when the settings format changes.
pub const SETTINGS_VERSION: &str = "0.1.0";


/// Returns sensible defaults for all settings fields.
pub fn default_settings() -> Settings {
    Settings {
        version: SETTINGS_VERSION.into(),
        hosts_file: PathBuf::from("/etc/hosts"),
        hostname_file: PathBuf::from("/etc/hostname"),
        network_config_file: PathBuf::from("/etc/sysconfig/network"),
        hostname_file_mode: 0o644,
        manage_ownership: true,
        hosts_address: None,
        platform: None,
        command_timeout_ms: 30_000,
        search_path: None,
    }
}


/// Load `Settings` from a YAML file. Missing keys fall back to defaults.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}


/// Like `load`, but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(default_settings());
    }
    load(path)
}


/// Save `Settings` to a YAML file, creating the parent directory.
pub fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let content = serde_yaml::to_string(settings)?;
    let write_err = |source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, content).map_err(write_err)
}


/// Parse settings from a YAML string. An empty document yields the defaults.
pub fn parse(content: &str) -> Result<Settings, SettingsError> {
    if content.trim().is_empty() {
        return Ok(default_settings());
    }
    Ok(serde_yaml::from_str(content)?)
}
