//! In-memory SessionStore implementation

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{ChatMessage, SessionStore};
use crate::attention::AttentionEvent;
use crate::error::StoreError;
use crate::phase::{PhaseTransition, SessionPhase, plan_transition};
use crate::session::{DerivedUpdate, Session, SessionStatus};

/// Session plus its append-only children
#[derive(Debug)]
struct SessionRecord {
    session: Session,
    events: Vec<AttentionEvent>,
    messages: Vec<ChatMessage>,
}

/// In-memory store, one RwLock over all records
///
/// Each trait method takes the lock once, which makes every operation
/// atomic with respect to the others.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `now`, or just after `last` when the clock has not moved past it
fn monotonic_after(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert_session(&self, session: Session) -> Result<Session, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&session.id) {
            return Err(StoreError::DuplicateSession(session.id));
        }
        records.insert(
            session.id.clone(),
            SessionRecord {
                session: session.clone(),
                events: Vec::new(),
                messages: Vec::new(),
            },
        );
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Session, StoreError> {
        self.records
            .read()
            .await
            .get(session_id)
            .map(|record| record.session.clone())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    async fn set_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<Session, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        if status == SessionStatus::InProgress {
            let started_at = monotonic_after(record.session.last_transition_at(), Utc::now());
            record.session.start(started_at);
        } else {
            record.session.status = status;
        }
        Ok(record.session.clone())
    }

    async fn append_event(&self, mut event: AttentionEvent) -> Result<AttentionEvent, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&event.session_id)
            .ok_or_else(|| StoreError::SessionNotFound(event.session_id.clone()))?;

        let last = record.events.last().map(|e| e.created_at);
        event.created_at = monotonic_after(last, event.created_at);
        record.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(&self, session_id: &str) -> Result<Vec<AttentionEvent>, StoreError> {
        self.records
            .read()
            .await
            .get(session_id)
            .map(|record| record.events.clone())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    async fn advance_phase(
        &self,
        session_id: &str,
        next: SessionPhase,
    ) -> Result<(Session, PhaseTransition), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        let transition = plan_transition(record.session.current_phase, next);
        let started_at = monotonic_after(record.session.last_transition_at(), Utc::now());
        record.session.apply_transition(&transition, started_at);

        Ok((record.session.clone(), transition))
    }

    async fn apply_derived(
        &self,
        session_id: &str,
        update: DerivedUpdate,
    ) -> Result<Session, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        record.session.apply_derived(update);
        Ok(record.session.clone())
    }

    async fn append_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&message.session_id)
            .ok_or_else(|| StoreError::SessionNotFound(message.session_id.clone()))?;
        record.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        self.records
            .read()
            .await
            .get(session_id)
            .map(|record| record.messages.clone())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    async fn session_count(&self) -> usize {
        self.records.read().await.len()
    }
}
