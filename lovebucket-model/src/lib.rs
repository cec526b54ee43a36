//! Identifiers and value types shared by the Lovebucket crates.
#![allow(missing_docs)]

pub mod bucket;
pub mod error;
pub mod ids;
pub mod toggle;

pub use bucket::{BUCKET_KINDS, BucketKind, MembershipState};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{COPY_NAMESPACE, CopyID, DestinationID, MediaID, UserID};
pub use toggle::ToggleState;
