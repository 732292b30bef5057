//! Enumeration types for the safe-zone controller.
//!
//! The sub-state machine vocabulary, the reasons the scheduler may freeze,
//! and the reasons a match run may end.

use serde::{Deserialize, Serialize};

/// The sub-state of the zone's phase state machine.
///
/// A match moves through these states under the control of the phase
/// scheduler, which is the only writer. The full lifecycle is:
///
/// `Idle -> (Announcing -> Shrinking -> Paused)* -> Announcing -> Shrinking -> Finished`
///
/// with one `Announcing -> Shrinking` pair per configured shrink step and
/// a `Paused` gap between consecutive steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubState {
    /// Match started, zone at full size, first announcement not yet due.
    Idle,
    /// The next shrink has been announced; radius holds at the phase
    /// start value while warning UI counts down.
    Announcing,
    /// The radius is interpolating from the phase start radius to the
    /// phase end radius.
    Shrinking,
    /// Between shrink steps; the wait length was fixed from the live
    /// player count when this state began.
    Paused,
    /// All shrink steps complete; radius frozen at the end radius.
    Finished,
}

impl SubState {
    /// Whether the zone is actively interpolating its radius.
    pub const fn is_shrinking(self) -> bool {
        matches!(self, Self::Shrinking)
    }

    /// Whether the zone is waiting between shrink steps.
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether the state machine has run to completion.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Why the scheduler froze instead of advancing.
///
/// A frozen scheduler stops firing transitions and applying damage but
/// keeps its state intact; it never resets phases or crashes the
/// surrounding simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreezeReason {
    /// The authoritative tick counter moved backwards.
    TickRegression,
    /// The local process lost authority over the match (host disconnect
    /// or migration in progress).
    AuthorityLost,
}

impl core::fmt::Display for FreezeReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TickRegression => write!(f, "tick regression"),
            Self::AuthorityLost => write!(f, "authority lost"),
        }
    }
}

/// Reason why a bounded match run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEndReason {
    /// The zone reached its final radius and the state machine finished.
    ZoneFinished,
    /// Reached the configured `max_ticks` limit before finishing.
    MaxTicksReached,
    /// An external stop was requested (match teardown).
    StopRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_state_predicates() {
        assert!(SubState::Shrinking.is_shrinking());
        assert!(!SubState::Paused.is_shrinking());
        assert!(SubState::Paused.is_paused());
        assert!(SubState::Finished.is_terminal());
        assert!(!SubState::Idle.is_terminal());
    }

    #[test]
    fn freeze_reason_displays() {
        assert_eq!(FreezeReason::TickRegression.to_string(), "tick regression");
        assert_eq!(FreezeReason::AuthorityLost.to_string(), "authority lost");
    }
}
