use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::ports::files::{FileCopier, FileCopyError};

/// File-backed copy storage rooted at a single directory.
///
/// Copies are written to a temp file first and then published with a hard
/// link, which fails if the final name is taken. Two writers racing on the
/// same deterministic name therefore end with exactly one file.
#[derive(Clone, Debug)]
pub struct LocalFileCopier {
    root: PathBuf,
}

impl LocalFileCopier {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<(), FileCopyError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            FileCopyError::Io(format!(
                "failed to create copy dir {:?}: {err}",
                self.root
            ))
        })
    }

    /// Resolve a relative copy name under the root. Rejects names that
    /// could escape it.
    pub fn path_for(&self, dest_name: &str) -> Result<PathBuf, FileCopyError> {
        let relative = Path::new(dest_name);
        if dest_name.is_empty()
            || relative.is_absolute()
            || dest_name.starts_with('\\')
        {
            return Err(FileCopyError::InvalidName(dest_name.to_string()));
        }
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(FileCopyError::InvalidName(dest_name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileCopier for LocalFileCopier {
    async fn copy(
        &self,
        source_path: &Path,
        dest_name: &str,
    ) -> Result<PathBuf, FileCopyError> {
        let path = self.path_for(dest_name)?;

        if !tokio::fs::try_exists(source_path).await.unwrap_or(false) {
            return Err(FileCopyError::MissingSource(source_path.to_path_buf()));
        }
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(FileCopyError::AlreadyExists(dest_name.to_string()));
        }

        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&parent).await.map_err(|err| {
            FileCopyError::Io(format!(
                "failed to create copy dir {parent:?}: {err}"
            ))
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = parent
            .join(format!(".{file_name}.tmp-{}", Uuid::new_v4().simple()));

        tokio::fs::copy(source_path, &tmp).await.map_err(|err| {
            FileCopyError::Io(format!(
                "failed to copy {source_path:?} -> {tmp:?}: {err}"
            ))
        })?;

        let published = tokio::fs::hard_link(&tmp, &path).await;
        let _ = tokio::fs::remove_file(&tmp).await;

        match published {
            Ok(()) => Ok(path),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(FileCopyError::AlreadyExists(dest_name.to_string()))
            }
            Err(err) => Err(FileCopyError::Io(format!(
                "failed to publish copy {path:?}: {err}"
            ))),
        }
    }

    async fn remove(&self, dest_name: &str) -> Result<bool, FileCopyError> {
        let path = self.path_for(dest_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(FileCopyError::Io(format!(
                "failed to remove copy {path:?}: {err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn source_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, b"pixels").await.unwrap();
        path
    }

    #[tokio::test]
    async fn copy_refuses_to_overwrite() {
        let media = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let copier = LocalFileCopier::new(store.path().to_path_buf());
        let source = source_file(&media, "cat.jpg").await;

        let path = copier.copy(&source, "u/abc.jpg").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"pixels");

        let second = copier.copy(&source, "u/abc.jpg").await;
        assert!(matches!(second, Err(FileCopyError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let store = TempDir::new().unwrap();
        let copier = LocalFileCopier::new(store.path().to_path_buf());

        let result = copier
            .copy(Path::new("/definitely/not/here.png"), "u/x.png")
            .await;
        assert!(matches!(result, Err(FileCopyError::MissingSource(_))));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let media = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let copier = LocalFileCopier::new(store.path().to_path_buf());
        let source = source_file(&media, "dog.png").await;

        let path = copier.copy(&source, "u/dog.png").await.unwrap();
        assert!(path.exists());
        assert!(copier.remove("u/dog.png").await.unwrap());
        assert!(!copier.remove("u/dog.png").await.unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn names_cannot_escape_the_root() {
        let copier = LocalFileCopier::new(PathBuf::from("/srv/copies"));
        assert!(copier.path_for("../etc/passwd").is_err());
        assert!(copier.path_for("/etc/passwd").is_err());
        assert!(copier.path_for("").is_err());
        assert!(copier.path_for("a/./b").is_ok());
    }
}
