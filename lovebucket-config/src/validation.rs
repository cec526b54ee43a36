use thiserror::Error;
use tracing::warn;

use crate::models::{Config, MAX_ALLOWED_LIKES_LIMIT};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error(
        "max_allowed_likes must be between 0 and {limit}, got {value}",
        limit = MAX_ALLOWED_LIKES_LIMIT
    )]
    MaxAllowedLikesOutOfRange { value: u64 },
    #[error("accepted mime prefix {prefix:?} {reason}")]
    InvalidMimePrefix { prefix: String, reason: &'static str },
    #[error("copies_root must not be empty")]
    EmptyCopiesRoot,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    /// Send every warning to the log.
    pub fn emit(&self) {
        for item in &self.items {
            match &item.hint {
                Some(hint) => warn!(hint = %hint, "{}", item.message),
                None => warn!("{}", item.message),
            }
        }
    }
}

/// Range check shared by the file and environment layers.
pub fn check_max_allowed_likes(value: u64) -> Result<u32, ConfigGuardRailError> {
    u32::try_from(value)
        .ok()
        .filter(|max| *max <= MAX_ALLOWED_LIKES_LIMIT)
        .ok_or(ConfigGuardRailError::MaxAllowedLikesOutOfRange { value })
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    check_max_allowed_likes(u64::from(config.likes.max_allowed_likes))?;

    for prefix in &config.likes.accepted_mime_prefixes {
        if prefix.trim().is_empty() {
            return Err(ConfigGuardRailError::InvalidMimePrefix {
                prefix: prefix.clone(),
                reason: "is empty",
            });
        }
        if !prefix.ends_with('/') {
            return Err(ConfigGuardRailError::InvalidMimePrefix {
                prefix: prefix.clone(),
                reason: "must end with '/'",
            });
        }
    }

    if config.likes.accepted_mime_prefixes.is_empty() {
        warnings.push_with_hint(
            "No accepted mime prefixes configured; nothing can be liked",
            "Set likes.accepted_mime_prefixes, for example [\"image/\"]",
        );
    }

    let copies_root = &config.storage.copies_root;
    if copies_root.as_os_str().is_empty() {
        return Err(ConfigGuardRailError::EmptyCopiesRoot);
    }
    if copies_root.is_relative() {
        warnings.push_with_hint(
            format!(
                "copies_root {} is relative and depends on the working directory",
                copies_root.display()
            ),
            "Set LOVEBUCKET_COPIES_ROOT to an absolute path",
        );
    }

    if config.database.url.is_none() {
        warnings.push("DATABASE_URL not configured; only in-memory storage is available");
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::models::{
        ConfigMetadata, DatabaseConfig, LikesConfig, StorageConfig,
    };

    fn config() -> Config {
        Config {
            likes: LikesConfig::default(),
            storage: StorageConfig {
                copies_root: PathBuf::from("/srv/copies"),
            },
            database: DatabaseConfig {
                url: Some("postgres://localhost/lovebucket".into()),
            },
            metadata: ConfigMetadata::default(),
        }
    }

    #[test]
    fn defaults_with_absolute_root_are_clean() {
        assert!(apply_guard_rails(&config()).unwrap().is_empty());
    }

    #[test]
    fn quota_range_matches_settings_screen() {
        assert_eq!(check_max_allowed_likes(0).unwrap(), 0);
        assert_eq!(check_max_allowed_likes(9_999_999).unwrap(), 9_999_999);
        assert!(matches!(
            check_max_allowed_likes(10_000_000),
            Err(ConfigGuardRailError::MaxAllowedLikesOutOfRange {
                value: 10_000_000
            })
        ));
        assert!(check_max_allowed_likes(u64::MAX).is_err());
    }

    #[test]
    fn mime_prefixes_must_be_type_prefixes() {
        let mut config = config();
        config.likes.accepted_mime_prefixes = vec!["image".into()];
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidMimePrefix { .. })
        ));
    }

    #[test]
    fn relative_root_only_warns() {
        let mut config = config();
        config.storage.copies_root = PathBuf::from("data/copies");
        let warnings = apply_guard_rails(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings.items[0].hint.is_some());
    }
}
