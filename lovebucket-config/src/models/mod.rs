use std::path::{Path, PathBuf};

use lovebucket_core::{LocalFileCopier, MediaRules, TogglePolicy};

/// Largest like quota the settings screen ever accepted.
pub const MAX_ALLOWED_LIKES_LIMIT: u32 = 9_999_999;

pub const DEFAULT_COPIES_ROOT: &str = "./data/copies";

#[derive(Debug, Clone)]
pub struct Config {
    pub likes: LikesConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn toggle_policy(&self) -> TogglePolicy {
        TogglePolicy::from(&self.likes)
    }

    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.storage.copies_root)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikesConfig {
    /// `0` means unlimited.
    pub max_allowed_likes: u32,
    pub love_disabled: bool,
    pub create_buckets_for_new_users: bool,
    pub accepted_mime_prefixes: Vec<String>,
}

impl Default for LikesConfig {
    fn default() -> Self {
        Self {
            max_allowed_likes: 0,
            love_disabled: false,
            create_buckets_for_new_users: false,
            accepted_mime_prefixes: default_mime_prefixes(),
        }
    }
}

pub fn default_mime_prefixes() -> Vec<String> {
    vec!["image/".to_string()]
}

impl From<&LikesConfig> for TogglePolicy {
    fn from(value: &LikesConfig) -> Self {
        TogglePolicy {
            max_allowed_likes: value.max_allowed_likes,
            love_disabled: value.love_disabled,
            create_buckets_for_new_users: value.create_buckets_for_new_users,
            media: MediaRules {
                accepted_mime_prefixes: value.accepted_mime_prefixes.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub copies_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            copies_root: PathBuf::from(DEFAULT_COPIES_ROOT),
        }
    }
}

impl StorageConfig {
    pub fn copies_root(&self) -> &Path {
        &self.copies_root
    }

    pub fn file_copier(&self) -> LocalFileCopier {
        LocalFileCopier::new(self.copies_root.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON; everything else is read as TOML.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Where the settings file came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Defaults,
    /// Passed to the loader directly.
    Explicit(PathBuf),
    /// Named by `LOVEBUCKET_CONFIG_PATH`.
    EnvPath(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Defaults => None,
            ConfigSource::Explicit(path) | ConfigSource::EnvPath(path) => {
                Some(path)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigMetadata {
    pub source: ConfigSource,
    pub format: Option<ConfigFormat>,
    pub env_file_loaded: bool,
    /// Environment variables that replaced a file or default value.
    pub env_overrides: Vec<&'static str>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        Self {
            source: ConfigSource::Defaults,
            format: None,
            env_file_loaded: false,
            env_overrides: Vec::new(),
        }
    }
}
