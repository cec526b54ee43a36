//! Transition tables for the like and love toggles.
//!
//! Each entry names the collection mutations to run, in order, and the
//! button states to report once they all succeed. Entries marked
//! `quota_gated` only run while the user is under the like quota.

use lovebucket_model::{BucketKind, MembershipState, ToggleState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Add(BucketKind),
    Remove(BucketKind),
}

impl Step {
    /// The step that undoes this one.
    pub fn inverse(&self) -> Step {
        match *self {
            Step::Add(kind) => Step::Remove(kind),
            Step::Remove(kind) => Step::Add(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub quota_gated: bool,
    pub steps: &'static [Step],
    pub report: &'static [(BucketKind, ToggleState)],
    pub next: MembershipState,
}

use BucketKind::{Like, Love};
use ToggleState::{Active, Static};

const LIKE_FROM_NONE: Transition = Transition {
    quota_gated: true,
    steps: &[Step::Add(Like)],
    report: &[(Like, Active)],
    next: MembershipState::Liked,
};

// Liking a loved item drops the love instead of the like, so the love
// collection never holds something the like collection does not.
const LIKE_FROM_LOVED: Transition = Transition {
    quota_gated: false,
    steps: &[Step::Remove(Love)],
    report: &[(Like, Active), (Love, Static)],
    next: MembershipState::Liked,
};

const LIKE_FROM_LIKED: Transition = Transition {
    quota_gated: false,
    steps: &[Step::Remove(Like)],
    report: &[(Like, Static)],
    next: MembershipState::None,
};

const LOVE_FROM_LIKED: Transition = Transition {
    quota_gated: false,
    steps: &[Step::Add(Love)],
    report: &[(Like, Static), (Love, Active)],
    next: MembershipState::LikedAndLoved,
};

const LOVE_FROM_LOVED: Transition = Transition {
    quota_gated: false,
    steps: &[Step::Remove(Love), Step::Remove(Like)],
    report: &[(Love, Static)],
    next: MembershipState::None,
};

const LOVE_FROM_NONE: Transition = Transition {
    quota_gated: true,
    steps: &[Step::Add(Like), Step::Add(Love)],
    report: &[(Love, Active)],
    next: MembershipState::LikedAndLoved,
};

/// Look up the transition for toggling `action` on an item in `state`.
pub fn transition(
    action: BucketKind,
    state: MembershipState,
) -> &'static Transition {
    match (action, state) {
        (Like, MembershipState::None) => &LIKE_FROM_NONE,
        (Like, MembershipState::LikedAndLoved) => &LIKE_FROM_LOVED,
        (Like, MembershipState::Liked) => &LIKE_FROM_LIKED,
        (Love, MembershipState::Liked) => &LOVE_FROM_LIKED,
        (Love, MembershipState::LikedAndLoved) => &LOVE_FROM_LOVED,
        (Love, MembershipState::None) => &LOVE_FROM_NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [MembershipState; 3] = [
        MembershipState::None,
        MembershipState::Liked,
        MembershipState::LikedAndLoved,
    ];

    /// Replays a transition's steps on raw membership flags.
    fn replay(state: MembershipState, steps: &[Step]) -> (bool, bool) {
        let (mut liked, mut loved) = (state.is_liked(), state.is_loved());
        for step in steps {
            match step {
                Step::Add(Like) => liked = true,
                Step::Add(Love) => loved = true,
                Step::Remove(Like) => liked = false,
                Step::Remove(Love) => loved = false,
            }
            assert!(liked || !loved, "step {step:?} left a loved-only item");
        }
        (liked, loved)
    }

    #[test]
    fn every_transition_reaches_its_declared_state() {
        for action in [Like, Love] {
            for state in STATES {
                let t = transition(action, state);
                let (liked, loved) = replay(state, t.steps);
                assert_eq!(
                    MembershipState::from_flags(liked, loved),
                    Some(t.next),
                    "{action:?} from {state:?}"
                );
            }
        }
    }

    #[test]
    fn only_new_likes_are_quota_gated() {
        for action in [Like, Love] {
            for state in STATES {
                let t = transition(action, state);
                assert_eq!(t.quota_gated, state == MembershipState::None);
            }
        }
    }

    #[test]
    fn inverse_undoes_a_step() {
        assert_eq!(Step::Add(Love).inverse(), Step::Remove(Love));
        assert_eq!(Step::Remove(Like).inverse(), Step::Add(Like));
    }
}
