//! PedagogyEngine - the inbound surface of the core
//!
//! Foreground operations persist synchronously and fail fast. Every accepted
//! write is pushed to the session room and then hands a trigger to the
//! evaluation orchestrator; the caller never waits on evaluation.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attention::{AttentionEvent, AttentionSummary, NewAttentionEvent};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evaluation::{EvaluationOrchestrator, Evaluator, PedagogyEvaluation};
use crate::phase::{PhaseTransition, SessionPhase};
use crate::realtime::{RealtimeEvent, RealtimePublisher, Room, RoomHub};
use crate::session::{Session, SessionStatus};
use crate::store::{ChatMessage, MemorySessionStore, SessionStore};

/// Result of `advance_phase`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAdvance {
    pub session: Session,
    pub transition: PhaseTransition,
}

/// Session pedagogy engine
pub struct PedagogyEngine {
    store: Arc<dyn SessionStore>,
    hub: Arc<RoomHub>,
    orchestrator: EvaluationOrchestrator,
}

impl PedagogyEngine {
    /// Engine backed by an in-memory store
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_store(Arc::new(MemorySessionStore::new()), config)
    }

    /// Engine over a caller-provided store
    pub fn with_store(store: Arc<dyn SessionStore>, config: &EngineConfig) -> Self {
        let hub = Arc::new(RoomHub::new(config.room_capacity));
        let publisher: Arc<dyn RealtimePublisher> = hub.clone();
        let orchestrator =
            EvaluationOrchestrator::new(store.clone(), publisher, config.evaluation_enabled);

        Self {
            store,
            hub,
            orchestrator,
        }
    }

    pub fn hub(&self) -> &Arc<RoomHub> {
        &self.hub
    }

    pub fn orchestrator(&self) -> &EvaluationOrchestrator {
        &self.orchestrator
    }

    // ==================== Sessions ====================

    /// Register a new scheduled session
    pub async fn create_session(
        &self,
        student_id: &str,
        tutor_id: &str,
    ) -> Result<Session, EngineError> {
        if student_id.trim().is_empty() || tutor_id.trim().is_empty() {
            return Err(EngineError::Validation(
                "student_id and tutor_id are required".to_string(),
            ));
        }

        let session = Session::new(Uuid::new_v4().to_string(), student_id, tutor_id);
        let session = self.store.insert_session(session).await?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, EngineError> {
        Ok(self.store.get_session(session_id).await?)
    }

    pub async fn start_session(&self, session_id: &str) -> Result<Session, EngineError> {
        let session = self
            .store
            .set_status(session_id, SessionStatus::InProgress)
            .await?;
        info!(session_id = %session_id, "Session started");
        Ok(session)
    }

    /// Mark the session completed and re-check its pedagogy
    pub async fn complete_session(&self, session_id: &str) -> Result<Session, EngineError> {
        let session = self
            .store
            .set_status(session_id, SessionStatus::Completed)
            .await?;
        info!(session_id = %session_id, "Session completed");
        self.orchestrator.trigger(session_id, Evaluator::Pedagogy);
        Ok(session)
    }

    pub async fn session_count(&self) -> usize {
        self.store.session_count().await
    }

    /// The user must be the session's student or tutor
    pub async fn verify_session_access(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Session, EngineError> {
        let session = self.store.get_session(session_id).await?;
        if !session.is_participant(user_id) {
            return Err(EngineError::Forbidden {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        Ok(session)
    }

    // ==================== Attention ====================

    /// Append an attention event and schedule attention evaluation
    pub async fn create_event(&self, new: NewAttentionEvent) -> Result<AttentionEvent, EngineError> {
        let event = new.into_event(Utc::now())?;
        let event = self.store.append_event(event).await?;
        debug!(
            session_id = %event.session_id,
            event_type = %event.event_type,
            "Attention event recorded"
        );

        let room = Room::session(event.session_id.as_str());
        self.hub
            .publish(&room, RealtimeEvent::AttentionEventCreated(event.clone()))
            .await;

        // The write already committed; a failed summary read only costs the push
        match self.get_attention_summary(&event.session_id).await {
            Ok(summary) => {
                self.hub
                    .publish(&room, RealtimeEvent::AttentionSummaryUpdated(summary))
                    .await;
            }
            Err(e) => {
                warn!(session_id = %event.session_id, error = %e, "Failed to publish attention summary");
            }
        }

        self.orchestrator.trigger(&event.session_id, Evaluator::Attention);
        Ok(event)
    }

    pub async fn get_attention_summary(
        &self,
        session_id: &str,
    ) -> Result<AttentionSummary, EngineError> {
        let events = self.store.list_events(session_id).await?;
        Ok(AttentionSummary::from_events(session_id, &events))
    }

    pub async fn list_events(&self, session_id: &str) -> Result<Vec<AttentionEvent>, EngineError> {
        Ok(self.store.list_events(session_id).await?)
    }

    // ==================== Phases ====================

    /// Move the session to `next` and schedule pedagogy evaluation
    ///
    /// Backward moves are logged and flagged on the result, never rejected.
    pub async fn advance_phase(
        &self,
        session_id: &str,
        next: SessionPhase,
    ) -> Result<PhaseAdvance, EngineError> {
        let (session, transition) = self.store.advance_phase(session_id, next).await?;

        if transition.is_backward() {
            warn!(
                session_id = %session_id,
                from = %transition.from,
                to = %transition.to,
                "Phase moved backwards"
            );
        } else {
            debug!(session_id = %session_id, from = %transition.from, to = %transition.to, "Phase advanced");
        }

        let timestamp = session.last_transition_at().unwrap_or_else(Utc::now);
        self.hub
            .publish(
                &Room::session(session_id),
                RealtimeEvent::PhaseUpdated {
                    session_id: session_id.to_string(),
                    phase: transition.to,
                    previous_phase: transition.from,
                    direction: transition.direction,
                    timestamp,
                },
            )
            .await;

        self.orchestrator.trigger(session_id, Evaluator::Pedagogy);
        Ok(PhaseAdvance {
            session,
            transition,
        })
    }

    /// Evaluate pedagogy now, serialized with background evaluations
    pub async fn get_pedagogy_status(
        &self,
        session_id: &str,
    ) -> Result<PedagogyEvaluation, EngineError> {
        self.orchestrator.evaluate_pedagogy(session_id).await
    }

    // ==================== Chat & Notifications ====================

    /// Persist a chat line and relay it to the rest of the session room
    pub async fn post_message(
        &self,
        session_id: &str,
        sender_id: &str,
        sender_name: &str,
        text: &str,
        origin: Option<&str>,
    ) -> Result<ChatMessage, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::Validation("message text is required".to_string()));
        }
        if sender_id.trim().is_empty() {
            return Err(EngineError::Validation("sender_id is required".to_string()));
        }

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            text: text.to_string(),
            sent_at: Utc::now(),
        };
        let message = self.store.append_message(message).await?;

        self.hub
            .publish_from(
                &Room::session(session_id),
                origin,
                RealtimeEvent::ChatMessage(message.clone()),
            )
            .await;
        Ok(message)
    }

    pub async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, EngineError> {
        Ok(self.store.list_messages(session_id).await?)
    }

    /// Direct notification to a user's personal room
    pub async fn notify_user(&self, user_id: &str, event: RealtimeEvent) -> usize {
        self.hub.publish(&Room::user(user_id), event).await
    }
}
