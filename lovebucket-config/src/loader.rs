use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    Config, ConfigFormat, ConfigMetadata, ConfigSource, DatabaseConfig,
    LikesConfig, StorageConfig, default_mime_prefixes,
};
use crate::sources::{
    ENV_COPIES_ROOT, ENV_CREATE_BUCKETS_FOR_NEW_USERS, ENV_DATABASE_URL,
    ENV_DISABLE_LOVE, ENV_MAX_ALLOWED_LIKES, EnvConfig, EnvSource, FileConfig,
    parse_switch,
};
use crate::validation::{
    self, ConfigGuardRailError, ConfigWarnings, check_max_allowed_likes,
};

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub env: EnvSource,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Read variables from `env` instead of the process environment.
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.options.env = env;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file_loaded) = self.load_env_file()?;
        let env_config = EnvConfig::gather(&env);

        let source = self.resolve_source(&env_config);
        let (file_config, format) = match source.path() {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig {
                        path: path.to_path_buf(),
                    });
                }
                let file = FileConfig::load_from_file(path).map_err(|err| {
                    ConfigLoadError::File {
                        path: path.to_path_buf(),
                        source: err,
                    }
                })?;
                (Some(file), Some(ConfigFormat::for_path(path)))
            }
            None => (None, None),
        };

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            ConfigMetadata {
                source,
                format,
                env_file_loaded,
                env_overrides: Vec::new(),
            },
        )?;

        info!(
            source = ?config.metadata.source,
            env_file_loaded = config.metadata.env_file_loaded,
            overrides = ?config.metadata.env_overrides,
            max_allowed_likes = config.likes.max_allowed_likes,
            love_disabled = config.likes.love_disabled,
            "loaded configuration"
        );

        Ok(ConfigLoad { config, warnings })
    }

    /// Apply the `.env` layer. Variables already set always win over the
    /// file.
    fn load_env_file(&self) -> Result<(EnvSource, bool), ConfigLoadError> {
        match &self.options.env {
            EnvSource::Process => {
                let loaded = match &self.options.env_file {
                    Some(path) => dotenvy::from_path(path).map(|_| true),
                    None => dotenvy::dotenv().map(|_| true),
                }
                .or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?;
                Ok((EnvSource::Process, loaded))
            }
            EnvSource::Fixed(vars) => {
                let Some(path) = &self.options.env_file else {
                    return Ok((self.options.env.clone(), false));
                };
                let iter = match dotenvy::from_path_iter(path) {
                    Ok(iter) => iter,
                    Err(dotenvy::Error::Io(_)) => {
                        return Ok((self.options.env.clone(), false));
                    }
                    Err(err) => return Err(err.into()),
                };
                let mut merged: HashMap<String, String> = HashMap::new();
                for item in iter {
                    let (key, value) = item?;
                    merged.insert(key, value);
                }
                merged.extend(vars.clone());
                Ok((EnvSource::Fixed(merged), true))
            }
        }
    }

    fn resolve_source(&self, env: &EnvConfig) -> ConfigSource {
        if let Some(path) = &self.options.config_path {
            ConfigSource::Explicit(path.clone())
        } else if let Some(path) = &env.config_path {
            ConfigSource::EnvPath(path.clone())
        } else {
            ConfigSource::Defaults
        }
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    mut metadata: ConfigMetadata,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No settings file loaded; using defaults and environment variables",
            "Point LOVEBUCKET_CONFIG_PATH at a TOML or JSON settings file",
        );
    }

    let FileConfig {
        likes: file_likes,
        storage: file_storage,
        database: file_database,
    } = file_config.unwrap_or_default();

    let max_allowed_likes = match env.max_allowed_likes.as_deref() {
        Some(raw) => {
            metadata.env_overrides.push(ENV_MAX_ALLOWED_LIKES);
            let value = raw.trim().parse::<u64>().map_err(|_| {
                ConfigLoadError::InvalidEnvValue {
                    name: ENV_MAX_ALLOWED_LIKES,
                    value: raw.to_string(),
                }
            })?;
            check_max_allowed_likes(value)?
        }
        None => match file_likes.max_allowed_likes {
            Some(value) => check_max_allowed_likes(value)?,
            None => 0,
        },
    };

    let love_disabled = env_switch(
        ENV_DISABLE_LOVE,
        env.disable_love.as_deref(),
        &mut metadata,
    )?
    .or(file_likes.love_disabled)
    .unwrap_or(false);

    let create_buckets_for_new_users = env_switch(
        ENV_CREATE_BUCKETS_FOR_NEW_USERS,
        env.create_buckets_for_new_users.as_deref(),
        &mut metadata,
    )?
    .or(file_likes.create_buckets_for_new_users)
    .unwrap_or(false);

    let likes = LikesConfig {
        max_allowed_likes,
        love_disabled,
        create_buckets_for_new_users,
        accepted_mime_prefixes: file_likes
            .accepted_mime_prefixes
            .unwrap_or_else(default_mime_prefixes),
    };

    let copies_root = match env.copies_root {
        Some(root) => {
            metadata.env_overrides.push(ENV_COPIES_ROOT);
            Some(root)
        }
        None => file_storage.copies_root,
    };
    let storage = match copies_root {
        Some(copies_root) => StorageConfig { copies_root },
        None => StorageConfig::default(),
    };

    let database_url = match env.database_url {
        Some(url) => {
            metadata.env_overrides.push(ENV_DATABASE_URL);
            Some(url)
        }
        None => file_database
            .url
            .filter(|value| !value.trim().is_empty()),
    };
    let database = DatabaseConfig { url: database_url };

    let config = Config {
        likes,
        storage,
        database,
        metadata,
    };

    let guard_warnings = validation::apply_guard_rails(&config)?;
    warnings.extend(guard_warnings);
    debug!(warnings = warnings.len(), "configuration passed guard rails");

    Ok((config, warnings))
}

fn env_switch(
    name: &'static str,
    raw: Option<&str>,
    metadata: &mut ConfigMetadata,
) -> Result<Option<bool>, ConfigLoadError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    metadata.env_overrides.push(name);
    parse_switch(raw)
        .map(Some)
        .ok_or_else(|| ConfigLoadError::InvalidEnvValue {
            name,
            value: raw.to_string(),
        })
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to load configuration {path}")]
    File {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("invalid value {value:?} for {name}")]
    InvalidEnvValue { name: &'static str, value: String },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
