use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Display state of a like or love button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ToggleState {
    Active,
    Static,
    Disabled,
}

impl ToggleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleState::Active => "active",
            ToggleState::Static => "static",
            ToggleState::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToggleState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(ToggleState::Active),
            "static" => Ok(ToggleState::Static),
            // Older clients sent "disable".
            "disabled" | "disable" => Ok(ToggleState::Disabled),
            other => Err(ModelError::InvalidToggleState(other.to_string())),
        }
    }
}
