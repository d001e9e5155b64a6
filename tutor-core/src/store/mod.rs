//! Persistence collaborator
//!
//! The engine only needs append to two collections, a whole-session read,
//! and an atomic merge-write of derived fields. `MemorySessionStore` is the
//! in-process implementation.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attention::AttentionEvent;
use crate::error::StoreError;
use crate::phase::{PhaseTransition, SessionPhase};
use crate::session::{DerivedUpdate, Session, SessionStatus};

pub use memory::MemorySessionStore;

/// A chat line posted to a session room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Record store keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session
    async fn insert_session(&self, session: Session) -> Result<Session, StoreError>;

    /// Read a session including its phase history
    async fn get_session(&self, session_id: &str) -> Result<Session, StoreError>;

    /// Set the external lifecycle status
    ///
    /// Moving into `InProgress` records the opening phase when the history
    /// is still empty.
    async fn set_status(&self, session_id: &str, status: SessionStatus)
    -> Result<Session, StoreError>;

    /// Append an attention event
    ///
    /// `created_at` is pushed forward if needed so that it is strictly
    /// greater than the session's previous event.
    async fn append_event(&self, event: AttentionEvent) -> Result<AttentionEvent, StoreError>;

    /// All events of a session in creation order
    async fn list_events(&self, session_id: &str) -> Result<Vec<AttentionEvent>, StoreError>;

    /// Plan and apply a transition to `next` in one write
    ///
    /// Two racing advances never both read the same `current_phase`.
    async fn advance_phase(
        &self,
        session_id: &str,
        next: SessionPhase,
    ) -> Result<(Session, PhaseTransition), StoreError>;

    /// Merge one evaluator's output into the derived fields
    async fn apply_derived(
        &self,
        session_id: &str,
        update: DerivedUpdate,
    ) -> Result<Session, StoreError>;

    async fn append_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError>;

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError>;

    async fn session_count(&self) -> usize;
}
