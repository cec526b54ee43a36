use lovebucket_model::{BucketKind, CopyID, DestinationID, MediaID, UserID};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LikeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("No {kind} collection is provisioned for user {user_id}")]
    FeatureDisabled { user_id: UserID, kind: BucketKind },

    #[error("Invalid collection binding: {0}")]
    InvalidBinding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, LikeError>;

/// Failures of the copy store. Collections absorb these into "no change".
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("copy {copy_id} of {source_id} already exists in destination {destination_id}")]
    AlreadyExists {
        source_id: MediaID,
        copy_id: CopyID,
        destination_id: DestinationID,
    },

    #[error("source {source_id} cannot be copied: {reason}")]
    SourceInvalid { source_id: MediaID, reason: String },

    #[error("copy storage I/O failed: {0}")]
    Io(String),

    #[error("removed {removed} copies, {failed} failed; first failure: {first}")]
    PartialSweep {
        removed: usize,
        failed: usize,
        #[source]
        first: Box<CopyError>,
    },
}

impl CopyError {
    pub fn source_invalid(source_id: MediaID, reason: impl Into<String>) -> Self {
        CopyError::SourceInvalid {
            source_id,
            reason: reason.into(),
        }
    }
}

impl From<LikeError> for CopyError {
    fn from(err: LikeError) -> Self {
        CopyError::Io(err.to_string())
    }
}

impl From<CopyError> for LikeError {
    fn from(err: CopyError) -> Self {
        LikeError::Storage(err.to_string())
    }
}
