//! Detect the running platform from os-release.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::ConvergeError;

const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Platform identification as `(family, distribution)`, ready for `classify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPlatform {
    pub family: String,
    pub distribution: String,
}

/// Read the first os-release file that exists and identify the platform.
pub fn detect() -> Result<DetectedPlatform, ConvergeError> {
    for path in OS_RELEASE_PATHS {
        if Path::new(path).exists() {
            return detect_from(Path::new(path));
        }
    }
    Err(ConvergeError::Detect("no os-release file found".into()))
}

pub fn detect_from(path: &Path) -> Result<DetectedPlatform, ConvergeError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConvergeError::Detect(format!("cannot read {}: {}", path.display(), e)))?;
    let detected = identify(&parse_os_release(&content));
    debug!(family = %detected.family, distribution = %detected.distribution, "detected platform");
    Ok(detected)
}

/// Map os-release variables onto a family. `ID` wins; `ID_LIKE` is the fallback.
pub fn identify(vars: &HashMap<String, String>) -> DetectedPlatform {
    let id = vars
        .get("ID")
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    let family = match id.as_str() {
        "debian" | "ubuntu" | "raspbian" | "linuxmint" | "pop" => Some("debian"),
        "rhel" | "centos" | "fedora" | "rocky" | "almalinux" | "ol" | "amzn" | "scientific" => {
            Some("rhel")
        }
        _ => None,
    };

    let family = family.or_else(|| {
        let like = vars.get("ID_LIKE")?.to_ascii_lowercase();
        if like.contains("debian") || like.contains("ubuntu") {
            Some("debian")
        } else if like.contains("rhel") || like.contains("fedora") || like.contains("centos") {
            Some("rhel")
        } else {
            None
        }
    });

    DetectedPlatform {
        family: family.unwrap_or("other").to_string(),
        distribution: if id.is_empty() { "unknown".into() } else { id },
    }
}

/// Parse os-release `KEY=value` lines, stripping quotes.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            vars.insert(key.trim().to_string(), value.to_string());
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::classify;
    use crate::types::platform::{PlatformFamily, ServiceBackend};

    #[test]
    fn parse_strips_quotes_and_comments() {
        let vars = parse_os_release("# comment\nID=ubuntu\nNAME=\"Ubuntu\"\nID_LIKE='debian'\n");
        assert_eq!(vars.get("ID").map(String::as_str), Some("ubuntu"));
        assert_eq!(vars.get("NAME").map(String::as_str), Some("Ubuntu"));
        assert_eq!(vars.get("ID_LIKE").map(String::as_str), Some("debian"));
    }

    #[test]
    fn ubuntu_is_debian_family() {
        let d = identify(&parse_os_release("ID=ubuntu\nID_LIKE=debian\n"));
        assert_eq!(d.family, "debian");
        assert_eq!(d.distribution, "ubuntu");
        assert_eq!(
            classify(&d.family, &d.distribution).service_backend,
            ServiceBackend::Upstart
        );
    }

    #[test]
    fn centos_is_redhat_family() {
        let d = identify(&parse_os_release("ID=\"centos\"\nID_LIKE=\"rhel fedora\"\n"));
        assert_eq!(d.family, "rhel");
        assert_eq!(classify(&d.family, &d.distribution).family, PlatformFamily::Redhat);
    }

    #[test]
    fn id_like_fallback() {
        let d = identify(&parse_os_release("ID=someforkos\nID_LIKE=\"ubuntu debian\"\n"));
        assert_eq!(d.family, "debian");
        assert_eq!(d.distribution, "someforkos");
    }

    #[test]
    fn unknown_platform_is_other() {
        let d = identify(&parse_os_release("ID=arch\n"));
        assert_eq!(d.family, "other");
        let d = identify(&parse_os_release(""));
        assert_eq!(d.distribution, "unknown");
    }

    #[test]
    fn detect_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, "ID=debian\nVERSION_ID=\"12\"\n").unwrap();
        let d = detect_from(&path).unwrap();
        assert_eq!(
            d,
            DetectedPlatform {
                family: "debian".into(),
                distribution: "debian".into()
            }
        );
    }

    #[test]
    fn detect_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            detect_from(&dir.path().join("nope")),
            Err(ConvergeError::Detect(_))
        ));
    }
}
