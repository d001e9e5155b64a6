//! Transition planning for the phase state machine
//!
//! The machine is forward-or-stay: moving to a lower index is observed and
//! flagged, never rejected. There is no terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{PhaseHistoryEntry, SessionPhase, TransitionDirection};

/// A transition accepted by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub direction: TransitionDirection,
}

impl PhaseTransition {
    pub fn is_backward(&self) -> bool {
        self.direction == TransitionDirection::Backward
    }

    /// History entry recording this transition
    pub fn entry(&self, started_at: DateTime<Utc>) -> PhaseHistoryEntry {
        PhaseHistoryEntry {
            phase: self.to,
            previous_phase: self.from,
            started_at,
        }
    }
}

/// Classify a transition from `current` to `next`
pub fn plan_transition(current: SessionPhase, next: SessionPhase) -> PhaseTransition {
    let direction = match next.index().cmp(&current.index()) {
        std::cmp::Ordering::Greater => TransitionDirection::Forward,
        std::cmp::Ordering::Equal => TransitionDirection::Repeat,
        std::cmp::Ordering::Less => TransitionDirection::Backward,
    };

    PhaseTransition {
        from: current,
        to: next,
        direction,
    }
}
