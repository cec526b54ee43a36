use crate::error::ModelError;
use std::str::FromStr;
use uuid::Uuid;

/// Namespace for v5 copy identifiers. Changing it orphans every stored copy.
pub const COPY_NAMESPACE: Uuid =
    Uuid::from_u128(0x6c6f_7665_6275_636b_6574_636f_7079_0001);

/// Strongly typed ID for the user who owns a pair of collections
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserID(pub Uuid);

impl Default for UserID {
    fn default() -> Self {
        Self::new()
    }
}

impl UserID {
    pub fn new() -> Self {
        UserID(Uuid::now_v7())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for UserID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserID {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(UserID)
    }
}

/// Strongly typed ID for a media item owned by the external media store.
///
/// Both source items and the copies made from them are media items, so a
/// `MediaID` handed in by a caller may name either.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaID(pub Uuid);

impl Default for MediaID {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaID {
    pub fn new() -> Self {
        MediaID(Uuid::now_v7())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for MediaID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for MediaID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MediaID {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(MediaID)
    }
}

/// Strongly typed ID for the destination a collection writes its copies into
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DestinationID(pub Uuid);

impl Default for DestinationID {
    fn default() -> Self {
        Self::new()
    }
}

impl DestinationID {
    pub fn new() -> Self {
        DestinationID(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for DestinationID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored copy.
///
/// Copy identifiers are never random: they are a v5 UUID over the source,
/// the owning user and the destination, so retrying a copy always lands on
/// the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyID(pub Uuid);

impl CopyID {
    pub fn derive(
        source: MediaID,
        owner: UserID,
        destination: DestinationID,
    ) -> Self {
        let mut name = [0u8; 48];
        name[..16].copy_from_slice(source.as_uuid().as_bytes());
        name[16..32].copy_from_slice(owner.as_uuid().as_bytes());
        name[32..].copy_from_slice(destination.as_uuid().as_bytes());
        CopyID(Uuid::new_v5(&COPY_NAMESPACE, &name))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<CopyID> for MediaID {
    fn from(value: CopyID) -> Self {
        MediaID(value.0)
    }
}

impl From<MediaID> for CopyID {
    fn from(value: MediaID) -> Self {
        CopyID(value.0)
    }
}

impl std::fmt::Display for CopyID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, ModelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelError::InvalidId("id cannot be empty".to_string()));
    }
    Uuid::parse_str(trimmed)
        .map_err(|err| ModelError::InvalidId(format!("{trimmed}: {err}")))
}
