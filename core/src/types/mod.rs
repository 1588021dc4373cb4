//! Plain data shared across the engine: identities, platform profiles,
//! planned actions and settings.

pub mod action;
pub mod config;
pub mod identity;
pub mod platform;
