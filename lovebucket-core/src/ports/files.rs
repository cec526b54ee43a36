use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileCopyError {
    #[error("a file named {0} already exists")]
    AlreadyExists(String),

    #[error("source file {0:?} does not exist")]
    MissingSource(PathBuf),

    #[error("invalid copy name: {0}")]
    InvalidName(String),

    #[error("file copy failed: {0}")]
    Io(String),
}

/// Raw file copy primitive used only by the copy store.
///
/// `copy` never overwrites: when `dest_name` is taken it fails with
/// [`FileCopyError::AlreadyExists`].
#[async_trait]
pub trait FileCopier: Send + Sync {
    async fn copy(
        &self,
        source_path: &Path,
        dest_name: &str,
    ) -> Result<PathBuf, FileCopyError>;

    /// Delete a stored copy. Removing a missing file returns `Ok(false)`.
    async fn remove(&self, dest_name: &str) -> Result<bool, FileCopyError>;
}
