//! hostident core — converges a host's hostname, domain and FQDN onto a
//! desired identity across Unix platforms.
//!
//! The pieces, leaves first: `platform` classifies the OS, `identity`
//! resolves the desired names, `guard` probes optional tools,
//! `convergence` plans and applies the actions, and `engine` ties a single
//! run together.

pub mod convergence;
pub mod data;
pub mod engine;
pub mod error;
pub mod guard;
pub mod hostinfo;
pub mod identity;
pub mod infrastructure;
pub mod platform;
pub mod types;

pub use engine::{Engine, Plan, RunReport};
pub use error::{ActionError, ConvergeError, RunError, SettingsError};
pub use types::identity::{CanonicalIdentity, DesiredIdentity};
pub use types::platform::PlatformProfile;
