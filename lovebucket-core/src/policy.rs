/// Settings the like/love core acts on. The core never loads these itself;
/// the caller resolves them (see `lovebucket-config`) and hands them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TogglePolicy {
    /// Upper bound on a user's LIKE collection. `0` means unlimited.
    pub max_allowed_likes: u32,
    pub love_disabled: bool,
    pub create_buckets_for_new_users: bool,
    pub media: MediaRules,
}

impl Default for TogglePolicy {
    fn default() -> Self {
        Self {
            max_allowed_likes: 0,
            love_disabled: false,
            create_buckets_for_new_users: false,
            media: MediaRules::default(),
        }
    }
}

impl TogglePolicy {
    pub fn with_max_allowed_likes(mut self, max: u32) -> Self {
        self.max_allowed_likes = max;
        self
    }

    pub fn with_love_disabled(mut self, disabled: bool) -> Self {
        self.love_disabled = disabled;
        self
    }
}

/// Which media items may be copied into a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRules {
    pub accepted_mime_prefixes: Vec<String>,
}

impl Default for MediaRules {
    fn default() -> Self {
        Self {
            accepted_mime_prefixes: vec!["image/".to_string()],
        }
    }
}

impl MediaRules {
    pub fn accepts(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        self.accepted_mime_prefixes
            .iter()
            .any(|prefix| mime_type.starts_with(&prefix.to_ascii_lowercase()))
    }
}
