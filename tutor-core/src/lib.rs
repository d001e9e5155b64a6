//! tutor-core - Session pedagogy engine
//!
//! Tracks what happens inside a live one-to-one tutoring session and derives
//! health signals from it. The crate provides:
//!
//! - An attention ledger of tutor/student interaction events and its summary score
//! - The six-phase lesson tracker with history
//! - Declarative attention and pedagogy rule tables
//! - A per-session serialized evaluation orchestrator
//! - Room-scoped real-time fan-out
//! - The [`PedagogyEngine`] facade tying them together

pub mod attention;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod phase;
pub mod realtime;
pub mod scoring;
pub mod session;
pub mod store;

pub use attention::{
    AttentionCounts, AttentionEvent, AttentionEventType, AttentionSummary, NewAttentionEvent,
};
pub use config::EngineConfig;
pub use engine::{PedagogyEngine, PhaseAdvance};
pub use error::{EngineError, StoreError};
pub use evaluation::{AttentionEvaluation, EvaluationOrchestrator, Evaluator, PedagogyEvaluation};
pub use phase::{PhaseHistoryEntry, PhaseTransition, SessionPhase, TransitionDirection};
pub use realtime::{Delivery, RealtimeEvent, RealtimePublisher, Room, RoomHub};
pub use session::{AttentionStatus, EvaluationMeta, PedagogyStatus, Session, SessionStatus};
pub use store::{ChatMessage, MemorySessionStore, SessionStore};
