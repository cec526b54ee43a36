#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use lovebucket_core::infra::{
    InMemoryCollectionLocator, InMemoryCopyLinkRepository, InMemoryMediaCatalog,
};
use lovebucket_core::{LikeLoveService, LocalFileCopier, TogglePolicy};
use lovebucket_model::{MediaID, UserID};
use tempfile::TempDir;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Once = Once::new();

/// Route test logs through `RUST_LOG`; silent by default.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("off")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A service wired to in-memory adapters and a scratch copy directory.
pub struct Fixture {
    pub service: LikeLoveService,
    pub media: Arc<InMemoryMediaCatalog>,
    pub links: Arc<InMemoryCopyLinkRepository>,
    pub locator: Arc<InMemoryCollectionLocator>,
    pub copies: TempDir,
    pub sources: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_policy(TogglePolicy::default())
    }

    pub fn with_policy(policy: TogglePolicy) -> Self {
        init_tracing();

        let media = Arc::new(InMemoryMediaCatalog::new());
        let links = Arc::new(InMemoryCopyLinkRepository::new());
        let locator = Arc::new(InMemoryCollectionLocator::new());
        let copies = TempDir::new().expect("copy dir");
        let sources = TempDir::new().expect("source dir");

        let service = LikeLoveService::new(
            locator.clone(),
            media.clone(),
            links.clone(),
            Arc::new(LocalFileCopier::new(copies.path().to_path_buf())),
            policy,
        );

        Self {
            service,
            media,
            links,
            locator,
            copies,
            sources,
        }
    }

    /// A user with both collections provisioned.
    pub async fn user(&self) -> UserID {
        let user = UserID::new();
        self.service.provision_user(user).await.expect("provision");
        user
    }

    /// Register an image backed by a real file.
    pub async fn image(&self) -> MediaID {
        self.media_item("image/jpeg", "jpg").await
    }

    pub async fn media_item(&self, mime: &str, extension: &str) -> MediaID {
        let id = MediaID::new();
        let path = self.sources.path().join(format!("{id}.{extension}"));
        tokio::fs::write(&path, id.as_str().as_bytes())
            .await
            .expect("write source");
        self.media.register(id, mime, path).await;
        id
    }

    /// Every regular file under the copy root.
    pub fn copy_files(&self) -> Vec<PathBuf> {
        fn walk(dir: &std::path::Path, out: &mut Vec<PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push(path);
                }
            }
        }
        let mut files = Vec::new();
        walk(self.copies.path(), &mut files);
        files
    }
}
