//! Configuration for Lovebucket.
//!
//! Settings come from an optional `.env` file, an optional TOML or JSON
//! settings file named by `LOVEBUCKET_CONFIG_PATH`, and environment
//! overrides, in that order. The result is checked against guard rails
//! before it is handed out.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};
pub use models::{
    Config, ConfigFormat, ConfigMetadata, ConfigSource, DatabaseConfig,
    LikesConfig, StorageConfig,
};
pub use sources::{EnvConfig, EnvSource, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
