use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// The two collections a user can put media into.
///
/// Every loved item is also liked, so `Love` is always the stricter of the
/// two memberships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BucketKind {
    Like,
    Love,
}

/// Lock and iteration order for the pair of collections.
pub const BUCKET_KINDS: [BucketKind; 2] = [BucketKind::Like, BucketKind::Love];

impl BucketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKind::Like => "like",
            BucketKind::Love => "love",
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "like" | "LIKE" | "bucketA" => Ok(BucketKind::Like),
            "love" | "LOVE" | "bucketB" => Ok(BucketKind::Love),
            other => Err(ModelError::InvalidBucket(other.to_string())),
        }
    }
}

/// Membership of one media item across a user's two collections.
///
/// Never stored; always recomputed from the two membership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MembershipState {
    None,
    Liked,
    LikedAndLoved,
}

impl MembershipState {
    /// Map raw membership flags onto a state.
    ///
    /// Returns `None` for the loved-but-not-liked combination, which the
    /// collections must never reach.
    pub fn from_flags(liked: bool, loved: bool) -> Option<Self> {
        match (liked, loved) {
            (false, false) => Some(MembershipState::None),
            (true, false) => Some(MembershipState::Liked),
            (true, true) => Some(MembershipState::LikedAndLoved),
            (false, true) => None,
        }
    }

    pub fn is_liked(&self) -> bool {
        !matches!(self, MembershipState::None)
    }

    pub fn is_loved(&self) -> bool {
        matches!(self, MembershipState::LikedAndLoved)
    }
}
