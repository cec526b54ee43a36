use lovebucket_model::{BucketKind, MediaID, ToggleState};
use serde::{Deserialize, Serialize};

/// Display state of one button after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub source_id: MediaID,
    pub kind: BucketKind,
    pub toggle_state: ToggleState,
}

/// What a toggle did, shaped for the UI that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Membership changed; the listed buttons must be redrawn.
    Changed { button_states: Vec<ButtonState> },
    /// The user already holds `max_allowed_likes` items.
    QuotaExceeded { max_allowed_likes: u32 },
    /// Nothing changed and there is nothing to show.
    NoOp,
}

impl ToggleOutcome {
    pub fn changed(
        source_id: MediaID,
        report: &[(BucketKind, ToggleState)],
    ) -> Self {
        ToggleOutcome::Changed {
            button_states: report
                .iter()
                .map(|&(kind, toggle_state)| ButtonState {
                    source_id,
                    kind,
                    toggle_state,
                })
                .collect(),
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ToggleOutcome::NoOp)
    }

    /// Reported state for `kind`, if the outcome mentions it.
    pub fn state_of(&self, kind: BucketKind) -> Option<ToggleState> {
        match self {
            ToggleOutcome::Changed { button_states } => button_states
                .iter()
                .find(|button| button.kind == kind)
                .map(|button| button.toggle_state),
            _ => None,
        }
    }
}
