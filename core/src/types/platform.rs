use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlatformFamily {
    Debian,
    Redhat,
    Other,
}

impl PlatformFamily {
    /// Map a platform family name onto the taxonomy. Unknown names are `Other`.
    pub fn parse(name: &str) -> PlatformFamily {
        match name.trim().to_ascii_lowercase().as_str() {
            "debian" => PlatformFamily::Debian,
            "redhat" | "rhel" | "fedora" | "centos" | "rocky" | "almalinux" | "amazon" => {
                PlatformFamily::Redhat
            }
            _ => PlatformFamily::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Debian => "debian",
            PlatformFamily::Redhat => "redhat",
            PlatformFamily::Other => "other",
        }
    }
}

/// Verb used when a notification fires the hostname service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceVerb {
    Start,
    Restart,
}

impl ServiceVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceVerb::Start => "start",
            ServiceVerb::Restart => "restart",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceBackend {
    Init,
    Upstart,
    None,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceSupports {
    pub restart: bool,
    pub status: bool,
    pub reload: bool,
}

/// Platform variance resolved once per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformProfile {
    pub family: PlatformFamily,
    pub distribution: String,
    pub service_name: Option<String>,
    pub service_supports: ServiceSupports,
    pub start_action: ServiceVerb,
    pub service_backend: ServiceBackend,
}

impl PlatformProfile {
    /// True when the hostname service must be notified after a hostname file change.
    pub fn manages_service(&self) -> bool {
        self.service_backend != ServiceBackend::None && self.service_name.is_some()
    }
}
