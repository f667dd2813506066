//! Configuration Module
//!
//! Process configuration for the copier, loaded once from the environment.

mod settings;

pub use settings::{AccountSettings, ConfigError, CopierConfig, Environment, RuntimeSettings};
