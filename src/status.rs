//! Calculation status values and the declared transition table.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a loss calculation.
///
/// The ordinal mapping is a wire contract shared with external consumers that
/// persist raw values. It must never drift.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum CalculationStatus {
    Pending = 0,
    Running = 1,
    Error = 2,
    Complete = 3,
    Dispatched = 4,
    Prepared = 5,
    OnHold = 6,
}

impl CalculationStatus {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Pending),
            1 => Some(Self::Running),
            2 => Some(Self::Error),
            3 => Some(Self::Complete),
            4 => Some(Self::Dispatched),
            5 => Some(Self::Prepared),
            6 => Some(Self::OnHold),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Collaborator seam for the dispatch layer: the store's guarded transition
/// consults one of these, so a deployment can substitute its own graph.
pub trait TransitionGuard: Send + Sync {
    fn allows(&self, from: CalculationStatus, to: CalculationStatus) -> bool;
}

/// Default transition table.
///
/// Pending -> Prepared -> Dispatched -> Running -> Complete | Error, with
/// OnHold reachable from Pending/Prepared and returning to either point, and
/// Error reachable from every non-terminal state (cancellation is a status
/// value, not a separate primitive).
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusTransitions;

const TRANSITIONS: &[(CalculationStatus, CalculationStatus)] = &[
    (CalculationStatus::Pending, CalculationStatus::Prepared),
    (CalculationStatus::Pending, CalculationStatus::OnHold),
    (CalculationStatus::Pending, CalculationStatus::Error),
    (CalculationStatus::Prepared, CalculationStatus::Dispatched),
    (CalculationStatus::Prepared, CalculationStatus::OnHold),
    (CalculationStatus::Prepared, CalculationStatus::Error),
    (CalculationStatus::Dispatched, CalculationStatus::Running),
    (CalculationStatus::Dispatched, CalculationStatus::Error),
    (CalculationStatus::Running, CalculationStatus::Complete),
    (CalculationStatus::Running, CalculationStatus::Error),
    (CalculationStatus::OnHold, CalculationStatus::Pending),
    (CalculationStatus::OnHold, CalculationStatus::Prepared),
];

impl TransitionGuard for StatusTransitions {
    fn allows(&self, from: CalculationStatus, to: CalculationStatus) -> bool {
        TRANSITIONS.contains(&(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::{CalculationStatus, StatusTransitions, TransitionGuard};

    const ALL: [CalculationStatus; 7] = [
        CalculationStatus::Pending,
        CalculationStatus::Running,
        CalculationStatus::Error,
        CalculationStatus::Complete,
        CalculationStatus::Dispatched,
        CalculationStatus::Prepared,
        CalculationStatus::OnHold,
    ];

    #[test]
    fn ordinals_are_pinned() {
        assert_eq!(CalculationStatus::Pending.as_i16(), 0);
        assert_eq!(CalculationStatus::Running.as_i16(), 1);
        assert_eq!(CalculationStatus::Error.as_i16(), 2);
        assert_eq!(CalculationStatus::Complete.as_i16(), 3);
        assert_eq!(CalculationStatus::Dispatched.as_i16(), 4);
        assert_eq!(CalculationStatus::Prepared.as_i16(), 5);
        assert_eq!(CalculationStatus::OnHold.as_i16(), 6);
    }

    #[test]
    fn ordinals_roundtrip() {
        for status in ALL {
            assert_eq!(CalculationStatus::from_i16(status.as_i16()), Some(status));
        }
        assert_eq!(CalculationStatus::from_i16(7), None);
        assert_eq!(CalculationStatus::from_i16(-1), None);
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        let guard = StatusTransitions;
        for from in [CalculationStatus::Complete, CalculationStatus::Error] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!guard.allows(from, to));
            }
        }
    }

    #[test]
    fn happy_path_is_allowed() {
        let guard = StatusTransitions;
        assert!(guard.allows(CalculationStatus::Pending, CalculationStatus::Prepared));
        assert!(guard.allows(CalculationStatus::Prepared, CalculationStatus::Dispatched));
        assert!(guard.allows(CalculationStatus::Dispatched, CalculationStatus::Running));
        assert!(guard.allows(CalculationStatus::Running, CalculationStatus::Complete));
        assert!(guard.allows(CalculationStatus::Running, CalculationStatus::Error));
    }

    #[test]
    fn hold_returns_to_its_origin_points() {
        let guard = StatusTransitions;
        assert!(guard.allows(CalculationStatus::Pending, CalculationStatus::OnHold));
        assert!(guard.allows(CalculationStatus::Prepared, CalculationStatus::OnHold));
        assert!(guard.allows(CalculationStatus::OnHold, CalculationStatus::Pending));
        assert!(guard.allows(CalculationStatus::OnHold, CalculationStatus::Prepared));
        assert!(!guard.allows(CalculationStatus::OnHold, CalculationStatus::Running));
    }

    #[test]
    fn skipping_states_is_rejected() {
        let guard = StatusTransitions;
        assert!(!guard.allows(CalculationStatus::Pending, CalculationStatus::Running));
        assert!(!guard.allows(CalculationStatus::Pending, CalculationStatus::Complete));
        assert!(!guard.allows(CalculationStatus::Complete, CalculationStatus::Pending));
    }
}
