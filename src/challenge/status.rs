//! Challenge status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a challenge. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Waiting for the challenged user to respond.
    Pending,
    /// Accepted, not yet started.
    Accepted,
    /// Rounds are being played.
    InProgress,
    /// Both players finished; outcome is set.
    Completed,
    /// The challenged user refused.
    Declined,
}

impl ChallengeStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Declined)
    }

    /// Whether `self → next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted | Self::Declined)
                | (Self::Accepted, Self::InProgress)
                | (Self::InProgress, Self::Completed)
        )
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Declined => "declined",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ChallengeStatus; 5] = [
        ChallengeStatus::Pending,
        ChallengeStatus::Accepted,
        ChallengeStatus::InProgress,
        ChallengeStatus::Completed,
        ChallengeStatus::Declined,
    ];

    #[test]
    fn test_forward_transitions() {
        use ChallengeStatus::{Accepted, Completed, Declined, InProgress, Pending};

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Declined));
        assert!(Accepted.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));

        assert!(!Accepted.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(Accepted));
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Declined.can_transition_to(Accepted));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_serde_names_match_display() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
