//! On-disk configuration for the engine.

pub mod settings;

pub use settings::{default_settings, load, load_or_default, save};
