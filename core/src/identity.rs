//! Resolves a desired hostname into its canonical identity.
//!
//! Pure: the same desired identity always resolves to the same canonical
//! identity, and the input is never modified.

use crate::error::ConvergeError;
use crate::types::identity::{CanonicalIdentity, DesiredIdentity};

/// Lowercase the short hostname and derive the FQDN.
///
/// A blank domain counts as no domain. Hostname syntax beyond the empty and
/// dotted checks is left to the tools that consume it.
pub fn resolve(desired: &DesiredIdentity) -> Result<CanonicalIdentity, ConvergeError> {
    let short = desired.short_hostname.trim().to_lowercase();
    if short.is_empty() {
        return Err(ConvergeError::EmptyHostname);
    }
    if short.contains('.') {
        return Err(ConvergeError::DottedShortHostname(short));
    }

    let domain = desired
        .domain_name
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let fqdn = match &domain {
        Some(d) => format!("{}.{}", short, d),
        None => short.clone(),
    };

    Ok(CanonicalIdentity {
        short_hostname: short,
        fqdn,
        domain_name: domain,
    })
}
