use std::path::Path;

use lovebucket_model::{CopyID, DestinationID, MediaID, UserID};
use sha2::{Digest, Sha256};

/// Longest source extension carried over onto a copy's file name.
const MAX_EXTENSION_LEN: usize = 10;

/// Deterministic identity of a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyName {
    pub copy_id: CopyID,
    /// Relative storage name, partitioned per owner: `{owner}/{digest}.{ext}`.
    pub file_name: String,
}

/// Derive the copy identity for `source` placed into `destination` for `owner`.
///
/// Only the extension of `source_path` is used, so moving the source file
/// does not change the name of its existing copies.
pub fn copy_name(
    source_id: MediaID,
    source_path: &Path,
    owner_id: UserID,
    destination_id: DestinationID,
) -> CopyName {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_uuid().as_bytes());
    hasher.update(owner_id.as_uuid().as_bytes());
    hasher.update(destination_id.as_uuid().as_bytes());
    let digest = hex::encode(hasher.finalize());

    let file_name = match extension_of(source_path) {
        Some(ext) => format!("{owner_id}/{digest}.{ext}"),
        None => format!("{owner_id}/{digest}"),
    };

    CopyName {
        copy_id: CopyID::derive(source_id, owner_id, destination_id),
        file_name,
    }
}

fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_depends_on_identity_not_location() {
        let source = MediaID::new();
        let owner = UserID::new();
        let destination = DestinationID::new();

        let a = copy_name(source, Path::new("/a/cat.JPG"), owner, destination);
        let b = copy_name(source, Path::new("/b/other.jpg"), owner, destination);
        assert_eq!(a, b);
        assert!(a.file_name.starts_with(&owner.as_str()));
        assert!(a.file_name.ends_with(".jpg"));
    }

    #[test]
    fn odd_extensions_are_dropped() {
        let source = MediaID::new();
        let owner = UserID::new();
        let destination = DestinationID::new();

        let name =
            copy_name(source, Path::new("/a/cat.j p*g"), owner, destination);
        assert!(!name.file_name.contains('.'));
        let bare = copy_name(source, Path::new("/a/cat"), owner, destination);
        assert_eq!(name.file_name, bare.file_name);
    }

    #[test]
    fn destinations_never_share_a_name() {
        let source = MediaID::new();
        let owner = UserID::new();
        let path = Path::new("/media/dog.png");

        let like = copy_name(source, path, owner, DestinationID::new());
        let love = copy_name(source, path, owner, DestinationID::new());
        assert_ne!(like.file_name, love.file_name);
        assert_ne!(like.copy_id, love.copy_id);
    }
}
