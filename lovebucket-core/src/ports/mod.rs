//! Ports (interfaces) to the collaborators the like/love core depends on.
//! Adapters live under `crate::infra`.

pub mod copy_links;
pub mod files;
pub mod locator;
pub mod media;

pub use copy_links::{CopyLink, CopyLinkRepository, LinkInsert};
pub use files::{FileCopier, FileCopyError};
pub use locator::CollectionLocator;
pub use media::MediaCatalog;
