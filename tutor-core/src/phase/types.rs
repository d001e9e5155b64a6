//! Phase and phase history types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One step of the fixed six-stage instructional script
///
/// Declaration order is the script order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    #[default]
    WarmConnect,
    Diagnose,
    MicroTeach,
    ActiveResponse,
    Reinforce,
    Reflect,
}

impl SessionPhase {
    pub const ORDER: [SessionPhase; 6] = [
        Self::WarmConnect,
        Self::Diagnose,
        Self::MicroTeach,
        Self::ActiveResponse,
        Self::Reinforce,
        Self::Reflect,
    ];

    /// Initial phase of every session
    pub const INITIAL: SessionPhase = Self::WarmConnect;

    /// Position in the script
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WarmConnect => "WARM_CONNECT",
            Self::Diagnose => "DIAGNOSE",
            Self::MicroTeach => "MICRO_TEACH",
            Self::ActiveResponse => "ACTIVE_RESPONSE",
            Self::Reinforce => "REINFORCE",
            Self::Reflect => "REFLECT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionPhase {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| EngineError::Validation(format!("unknown session phase: {s}")))
    }
}

/// How a transition moves through the script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDirection {
    Forward,
    /// Re-entry into the current phase
    Repeat,
    /// Flagged but accepted
    Backward,
}

/// Append-only record of one phase transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseHistoryEntry {
    pub phase: SessionPhase,
    pub previous_phase: SessionPhase,
    pub started_at: DateTime<Utc>,
}
