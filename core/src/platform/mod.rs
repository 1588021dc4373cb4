//! Maps the running OS onto a `PlatformProfile`.
//!
//! `PROFILE_TABLE` is the only place platform variance lives. Rows are
//! matched in order; a row with no distribution matches any distribution of
//! its family. Pairs without a row get a profile with no service backend.

pub mod detect;

use crate::types::platform::{
    PlatformFamily, PlatformProfile, ServiceBackend, ServiceSupports, ServiceVerb,
};

struct ProfileRow {
    family: PlatformFamily,
    distribution: Option<&'static str>,
    service_name: Option<&'static str>,
    supports: ServiceSupports,
    start_action: ServiceVerb,
    backend: ServiceBackend,
}

const NO_SUPPORT: ServiceSupports = ServiceSupports {
    restart: false,
    status: false,
    reload: false,
};

const PROFILE_TABLE: &[ProfileRow] = &[
    ProfileRow {
        family: PlatformFamily::Debian,
        distribution: Some("debian"),
        service_name: Some("hostname.sh"),
        supports: ServiceSupports {
            restart: false,
            status: true,
            reload: false,
        },
        start_action: ServiceVerb::Start,
        backend: ServiceBackend::Init,
    },
    ProfileRow {
        family: PlatformFamily::Debian,
        distribution: Some("ubuntu"),
        service_name: Some("hostname"),
        supports: ServiceSupports {
            restart: true,
            status: true,
            reload: true,
        },
        start_action: ServiceVerb::Restart,
        backend: ServiceBackend::Upstart,
    },
    // The network config file is edited directly; no service involved.
    ProfileRow {
        family: PlatformFamily::Redhat,
        distribution: None,
        service_name: None,
        supports: NO_SUPPORT,
        start_action: ServiceVerb::Start,
        backend: ServiceBackend::None,
    },
    ProfileRow {
        family: PlatformFamily::Other,
        distribution: None,
        service_name: None,
        supports: NO_SUPPORT,
        start_action: ServiceVerb::Start,
        backend: ServiceBackend::None,
    },
];

impl ProfileRow {
    fn matches(&self, family: PlatformFamily, distribution: &str) -> bool {
        self.family == family
            && self
                .distribution
                .map_or(true, |d| d.eq_ignore_ascii_case(distribution))
    }

    fn to_profile(&self, distribution: &str) -> PlatformProfile {
        PlatformProfile {
            family: self.family,
            distribution: distribution.to_string(),
            service_name: self.service_name.map(str::to_string),
            service_supports: self.supports,
            start_action: self.start_action,
            service_backend: self.backend,
        }
    }
}

/// Classify a platform given its family and distribution names.
pub fn classify(os_family: &str, os_distribution: &str) -> PlatformProfile {
    let family = PlatformFamily::parse(os_family);
    let distribution = os_distribution.trim().to_ascii_lowercase();

    match PROFILE_TABLE.iter().find(|row| row.matches(family, &distribution)) {
        Some(row) => row.to_profile(&distribution),
        None => PlatformProfile {
            family,
            distribution,
            service_name: None,
            service_supports: NO_SUPPORT,
            start_action: ServiceVerb::Start,
            service_backend: ServiceBackend::None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debian_uses_init_script() {
        let p = classify("debian", "debian");
        assert_eq!(p.family, PlatformFamily::Debian);
        assert_eq!(p.service_name.as_deref(), Some("hostname.sh"));
        assert_eq!(
            p.service_supports,
            ServiceSupports {
                restart: false,
                status: true,
                reload: false
            }
        );
        assert_eq!(p.start_action, ServiceVerb::Start);
        assert_eq!(p.service_backend, ServiceBackend::Init);
        assert!(p.manages_service());
    }

    #[test]
    fn ubuntu_uses_upstart_restart() {
        let p = classify("debian", "ubuntu");
        assert_eq!(p.service_name.as_deref(), Some("hostname"));
        assert_eq!(
            p.service_supports,
            ServiceSupports {
                restart: true,
                status: true,
                reload: true
            }
        );
        assert_eq!(p.start_action, ServiceVerb::Restart);
        assert_eq!(p.service_backend, ServiceBackend::Upstart);
    }

    #[test]
    fn redhat_any_distribution_has_no_service() {
        for dist in ["centos", "redhat", "fedora", "amazon"] {
            let p = classify("rhel", dist);
            assert_eq!(p.family, PlatformFamily::Redhat);
            assert_eq!(p.distribution, dist);
            assert!(p.service_name.is_none());
            assert_eq!(p.service_backend, ServiceBackend::None);
            assert!(!p.manages_service());
        }
    }

    #[test]
    fn other_family_has_no_service() {
        let p = classify("arch", "arch");
        assert_eq!(p.family, PlatformFamily::Other);
        assert_eq!(p.service_backend, ServiceBackend::None);
    }

    #[test]
    fn debian_family_unknown_distribution_falls_back_to_none() {
        let p = classify("debian", "linuxmint");
        assert_eq!(p.family, PlatformFamily::Debian);
        assert_eq!(p.distribution, "linuxmint");
        assert!(p.service_name.is_none());
        assert_eq!(p.service_backend, ServiceBackend::None);
    }

    #[test]
    fn matching_ignores_case() {
        let p = classify("Debian", "Ubuntu");
        assert_eq!(p.service_backend, ServiceBackend::Upstart);
        assert_eq!(p.distribution, "ubuntu");
    }
}
