use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::ConfigFormat;

pub const ENV_CONFIG_PATH: &str = "LOVEBUCKET_CONFIG_PATH";
pub const ENV_MAX_ALLOWED_LIKES: &str = "LOVEBUCKET_MAX_ALLOWED_LIKES";
pub const ENV_DISABLE_LOVE: &str = "LOVEBUCKET_DISABLE_LOVE";
pub const ENV_CREATE_BUCKETS_FOR_NEW_USERS: &str =
    "LOVEBUCKET_CREATE_BUCKETS_FOR_NEW_USERS";
pub const ENV_COPIES_ROOT: &str = "LOVEBUCKET_COPIES_ROOT";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Raw settings file contents.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub likes: FileLikesConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
}

impl FileConfig {
    pub fn parse(raw: &str, format: ConfigFormat) -> anyhow::Result<Self> {
        match format {
            ConfigFormat::Toml => {
                toml::from_str(raw).context("invalid TOML settings")
            }
            ConfigFormat::Json => {
                serde_json::from_str(raw).context("invalid JSON settings")
            }
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&raw, ConfigFormat::for_path(path))
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLikesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_allowed_likes: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub love_disabled: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub create_buckets_for_new_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_mime_prefixes: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies_root: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Parse an on/off switch. Settings stored by older installs use `"1"` and
/// `"0"`.
pub fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSwitch {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn deserialize_switch<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawSwitch>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let parsed = match &raw {
        RawSwitch::Bool(value) => Some(*value),
        RawSwitch::Int(0) => Some(false),
        RawSwitch::Int(1) => Some(true),
        RawSwitch::Int(_) => None,
        RawSwitch::Text(text) => parse_switch(text),
    };
    parsed.map(Some).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "expected one of 1/0/true/false/yes/no/on/off, got {}",
            match raw {
                RawSwitch::Bool(value) => value.to_string(),
                RawSwitch::Int(value) => value.to_string(),
                RawSwitch::Text(text) => format!("{text:?}"),
            }
        ))
    })
}

/// Where environment variables are read from.
#[derive(Clone, Default)]
pub enum EnvSource {
    #[default]
    Process,
    /// A fixed set of variables; the process environment is ignored.
    Fixed(HashMap<String, String>),
}

impl fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvSource::Process => f.write_str("Process"),
            EnvSource::Fixed(vars) => {
                let mut keys: Vec<_> = vars.keys().collect();
                keys.sort();
                f.debug_tuple("Fixed").field(&keys).finish()
            }
        }
    }
}

impl EnvSource {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvSource::Fixed(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn var(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => std::env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self, EnvSource::Process)
    }
}

/// Raw environment values. Parsing and range checks happen in the loader
/// so a bad value can name its variable.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub max_allowed_likes: Option<String>,
    pub disable_love: Option<String>,
    pub create_buckets_for_new_users: Option<String>,
    pub copies_root: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl EnvConfig {
    pub fn gather(env: &EnvSource) -> Self {
        let non_empty = |name: &str| {
            env.var(name).filter(|value| !value.trim().is_empty())
        };

        Self {
            config_path: non_empty(ENV_CONFIG_PATH).map(PathBuf::from),
            max_allowed_likes: non_empty(ENV_MAX_ALLOWED_LIKES),
            disable_love: non_empty(ENV_DISABLE_LOVE),
            create_buckets_for_new_users: non_empty(
                ENV_CREATE_BUCKETS_FOR_NEW_USERS,
            ),
            copies_root: non_empty(ENV_COPIES_ROOT).map(PathBuf::from),
            database_url: non_empty(ENV_DATABASE_URL),
        }
    }
}
