//! Session phase state machine

pub mod tracker;
pub mod types;

pub use tracker::{PhaseTransition, plan_transition};
pub use types::{PhaseHistoryEntry, SessionPhase, TransitionDirection};
