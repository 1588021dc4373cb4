//! File primitives for the hosts file, the hostname file and the shared
//! network configuration file.
//!
//! Every writer compares the desired bytes with what is on disk and only
//! touches the file when they differ, so a converged host sees no writes.

use std::io::ErrorKind;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use tracing::{info, warn};

use crate::error::ActionError;

// ---------------------------------------------------------------------------
// Hosts file
// ---------------------------------------------------------------------------

/// Format a hosts line. Aliases equal to the hostname, or repeated, are dropped.
pub fn hosts_line(address: &str, hostname: &str, aliases: &[String]) -> String {
    let mut fields = vec![address, hostname];
    for alias in aliases {
        if !fields[1..].contains(&alias.as_str()) {
            fields.push(alias);
        }
    }
    fields.join(" ")
}

fn entry_fields(line: &str) -> Vec<&str> {
    let body = line.split('#').next().unwrap_or("");
    body.split_whitespace().collect()
}

/// Return `existing` with exactly one entry for `address`.
///
/// The first line for the address is replaced in place (kept byte-for-byte
/// when its fields already match), later lines for the same address are
/// removed, and the entry is appended when the address is not present.
pub fn render_hosts(existing: &str, address: &str, hostname: &str, aliases: &[String]) -> String {
    let wanted = hosts_line(address, hostname, aliases);
    let wanted_fields: Vec<&str> = wanted.split(' ').collect();

    let mut out = String::with_capacity(existing.len() + wanted.len() + 1);
    let mut placed = false;

    for line in existing.split_inclusive('\n') {
        let fields = entry_fields(line);
        if fields.first() != Some(&address) {
            out.push_str(line);
            continue;
        }
        if placed {
            continue;
        }
        placed = true;
        if fields == wanted_fields {
            out.push_str(line);
        } else {
            out.push_str(&wanted);
            out.push('\n');
        }
    }

    if !placed {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&wanted);
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Generic write-if-changed
// ---------------------------------------------------------------------------

/// Ownership and mode to enforce on a managed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileAttrs {
    pub mode: Option<u32>,
    pub owner: Option<(u32, u32)>,
}

pub fn read_optional(path: &Path) -> Result<Option<String>, ActionError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ActionError::io("read", path, e)),
    }
}

/// What `write_if_changed` had to touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub content: bool,
    pub attrs: bool,
}

impl WriteOutcome {
    pub fn changed(&self) -> bool {
        self.content || self.attrs
    }
}

/// Write `content` to `path` when it differs, then enforce `attrs`.
pub fn write_if_changed(path: &Path, content: &str, attrs: FileAttrs) -> Result<WriteOutcome, ActionError> {
    let mut outcome = WriteOutcome::default();

    if read_optional(path)?.as_deref() != Some(content) {
        std::fs::write(path, content).map_err(|e| ActionError::io("write", path, e))?;
        info!(path = %path.display(), "updated file contents");
        outcome.content = true;
    }

    let meta = std::fs::metadata(path).map_err(|e| ActionError::io("stat", path, e))?;

    if let Some(mode) = attrs.mode {
        if meta.permissions().mode() & 0o7777 != mode {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| ActionError::io("chmod", path, e))?;
            info!(path = %path.display(), mode = format!("{:o}", mode), "updated file mode");
            outcome.attrs = true;
        }
    }

    if let Some((uid, gid)) = attrs.owner {
        if meta.uid() != uid || meta.gid() != gid {
            std::os::unix::fs::chown(path, Some(uid), Some(gid))
                .map_err(|e| ActionError::io("chown", path, e))?;
            info!(path = %path.display(), uid, gid, "updated file owner");
            outcome.attrs = true;
        }
    }

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Network configuration (redhat family)
// ---------------------------------------------------------------------------

/// Point every `HOSTNAME=` assignment at `fqdn`, leaving all other bytes
/// alone. Appends the assignment when the file has none.
pub fn rewrite_hostname_line(content: &str, fqdn: &str) -> String {
    let mut out = String::with_capacity(content.len() + fqdn.len());
    let mut found = false;

    for line in content.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if line[indent..].starts_with("HOSTNAME=") {
            found = true;
            let ending = if line.ends_with("\r\n") {
                "\r\n"
            } else if line.ends_with('\n') {
                "\n"
            } else {
                ""
            };
            out.push_str(&line[..indent]);
            out.push_str("HOSTNAME=");
            out.push_str(fqdn);
            out.push_str(ending);
        } else {
            out.push_str(line);
        }
    }

    if !found {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("HOSTNAME=");
        out.push_str(fqdn);
        out.push('\n');
    }
    out
}

/// Edit the `HOSTNAME=` line of the network config file in place.
/// A missing file is left alone.
pub fn edit_network_config(path: &Path, fqdn: &str) -> Result<bool, ActionError> {
    let Some(existing) = read_optional(path)? else {
        warn!(path = %path.display(), "network config file missing, not editing");
        return Ok(false);
    };
    let updated = rewrite_hostname_line(&existing, fqdn);
    if updated == existing {
        return Ok(false);
    }
    std::fs::write(path, updated).map_err(|e| ActionError::io("write", path, e))?;
    info!(path = %path.display(), fqdn, "rewrote HOSTNAME line");
    Ok(true)
}
