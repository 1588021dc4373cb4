use serde::{Deserialize, Serialize};

/// The identity the caller asks for. Owned by the run and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesiredIdentity {
    pub short_hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
}

impl DesiredIdentity {
    pub fn new(short_hostname: impl Into<String>, domain_name: Option<String>) -> Self {
        DesiredIdentity {
            short_hostname: short_hostname.into(),
            domain_name,
        }
    }
}

/// Identity after normalization. `fqdn` is always derivable from the
/// desired identity it was resolved from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalIdentity {
    pub short_hostname: String,
    pub fqdn: String,
    /// Domain as supplied (trimmed). `None` when absent or blank.
    pub domain_name: Option<String>,
}

impl CanonicalIdentity {
    /// The argument handed to `domainname`, empty when there is no domain.
    pub fn domain_or_empty(&self) -> &str {
        self.domain_name.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desired_identity_domain_is_optional_in_yaml() {
        let d: DesiredIdentity = serde_yaml::from_str("short_hostname: web01\n").unwrap();
        assert_eq!(d.short_hostname, "web01");
        assert!(d.domain_name.is_none());
    }

    #[test]
    fn domain_or_empty() {
        let c = CanonicalIdentity {
            short_hostname: "db1".into(),
            fqdn: "db1".into(),
            domain_name: None,
        };
        assert_eq!(c.domain_or_empty(), "");
    }
}
