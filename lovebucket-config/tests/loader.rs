use std::fs;
use std::path::PathBuf;

use lovebucket_config::{
    ConfigFormat, ConfigGuardRailError, ConfigLoadError, ConfigLoader,
    ConfigSource, EnvSource,
};
use tempfile::TempDir;

fn loader(vars: &[(&str, &str)]) -> ConfigLoader {
    ConfigLoader::new().with_env(EnvSource::fixed(vars.iter().copied()))
}

#[test]
fn defaults_without_file_or_env() {
    let load = loader(&[]).load().unwrap();
    let config = load.config;

    assert_eq!(config.likes.max_allowed_likes, 0);
    assert!(!config.likes.love_disabled);
    assert!(!config.likes.create_buckets_for_new_users);
    assert_eq!(config.likes.accepted_mime_prefixes, vec!["image/"]);
    assert_eq!(config.storage.copies_root, PathBuf::from("./data/copies"));
    assert_eq!(config.database.url, None);
    assert_eq!(config.metadata.source, ConfigSource::Defaults);
    assert!(!config.metadata.env_file_loaded);
    // No file, relative root, no database.
    assert_eq!(load.warnings.len(), 3);
}

#[test]
fn toml_file_named_by_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lovebucket.toml");
    fs::write(
        &path,
        r#"
        [likes]
        max_allowed_likes = 25
        love_disabled = "1"
        accepted_mime_prefixes = ["image/", "video/"]

        [storage]
        copies_root = "/srv/lovebucket/copies"

        [database]
        url = "postgres://db/lovebucket"
        "#,
    )
    .unwrap();

    let config = loader(&[("LOVEBUCKET_CONFIG_PATH", path.to_str().unwrap())])
        .load()
        .unwrap()
        .config;

    assert_eq!(config.metadata.source, ConfigSource::EnvPath(path));
    assert_eq!(config.metadata.format, Some(ConfigFormat::Toml));
    assert_eq!(config.likes.max_allowed_likes, 25);
    assert!(config.likes.love_disabled);
    assert_eq!(config.likes.accepted_mime_prefixes, vec!["image/", "video/"]);
    assert_eq!(
        config.storage.copies_root,
        PathBuf::from("/srv/lovebucket/copies")
    );
    assert_eq!(
        config.database.url.as_deref(),
        Some("postgres://db/lovebucket")
    );

    let policy = config.toggle_policy();
    assert_eq!(policy.max_allowed_likes, 25);
    assert!(policy.media.accepts("video/mp4"));
}

#[test]
fn json_file_and_env_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("likes.json");
    fs::write(
        &path,
        r#"{"likes": {"max_allowed_likes": 3, "create_buckets_for_new_users": true}}"#,
    )
    .unwrap();

    let config = loader(&[
        ("LOVEBUCKET_MAX_ALLOWED_LIKES", "7"),
        ("LOVEBUCKET_CREATE_BUCKETS_FOR_NEW_USERS", "off"),
        ("LOVEBUCKET_COPIES_ROOT", "/var/copies"),
        ("DATABASE_URL", "postgres://env/lovebucket"),
    ])
    .with_config_path(&path)
    .load()
    .unwrap()
    .config;

    assert_eq!(config.metadata.source, ConfigSource::Explicit(path));
    assert_eq!(config.metadata.format, Some(ConfigFormat::Json));
    assert_eq!(config.likes.max_allowed_likes, 7);
    assert!(!config.likes.create_buckets_for_new_users);
    assert_eq!(config.storage.copies_root, PathBuf::from("/var/copies"));
    assert_eq!(
        config.metadata.env_overrides,
        vec![
            "LOVEBUCKET_MAX_ALLOWED_LIKES",
            "LOVEBUCKET_CREATE_BUCKETS_FOR_NEW_USERS",
            "LOVEBUCKET_COPIES_ROOT",
            "DATABASE_URL",
        ]
    );
}

#[test]
fn env_file_fills_unset_variables() {
    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");
    fs::write(
        &env_file,
        "LOVEBUCKET_DISABLE_LOVE=yes\nLOVEBUCKET_MAX_ALLOWED_LIKES=4\n",
    )
    .unwrap();

    let config = loader(&[("LOVEBUCKET_MAX_ALLOWED_LIKES", "9")])
        .with_env_file(&env_file)
        .load()
        .unwrap()
        .config;

    assert!(config.metadata.env_file_loaded);
    assert!(config.likes.love_disabled);
    assert_eq!(config.likes.max_allowed_likes, 9);
}

#[test]
fn quota_out_of_range_is_rejected() {
    let err = loader(&[("LOVEBUCKET_MAX_ALLOWED_LIKES", "10000000")])
        .load()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(
            ConfigGuardRailError::MaxAllowedLikesOutOfRange { value: 10_000_000 }
        )
    ));

    let err = loader(&[("LOVEBUCKET_MAX_ALLOWED_LIKES", "-1")])
        .load()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::InvalidEnvValue {
            name: "LOVEBUCKET_MAX_ALLOWED_LIKES",
            ..
        }
    ));
}

#[test]
fn unknown_switch_values_are_rejected() {
    let err = loader(&[("LOVEBUCKET_DISABLE_LOVE", "sometimes")])
        .load()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::InvalidEnvValue {
            name: "LOVEBUCKET_DISABLE_LOVE",
            ..
        }
    ));
}

#[test]
fn missing_or_broken_files_are_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("absent.toml");
    let err = loader(&[]).with_config_path(&missing).load().unwrap_err();
    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));

    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "[likes\nmax_allowed_likes = ").unwrap();
    let err = loader(&[]).with_config_path(&broken).load().unwrap_err();
    assert!(matches!(err, ConfigLoadError::File { .. }));

    let bad_prefix = dir.path().join("prefix.toml");
    fs::write(&bad_prefix, "[likes]\naccepted_mime_prefixes = [\"image\"]\n")
        .unwrap();
    let err = loader(&[]).with_config_path(&bad_prefix).load().unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidMimePrefix { .. })
    ));
}
