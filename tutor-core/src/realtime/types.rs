//! Room and real-time event definitions

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attention::{AttentionCounts, AttentionEvent, AttentionSummary};
use crate::phase::{SessionPhase, TransitionDirection};
use crate::session::{AttentionStatus, PedagogyStatus};
use crate::store::ChatMessage;

/// A broadcast channel scoped to a session or a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Room {
    Session(String),
    User(String),
}

impl Room {
    pub fn session(id: impl Into<String>) -> Self {
        Self::Session(id.into())
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::User(id.into())
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(id) => write!(f, "session-{id}"),
            Self::User(id) => write!(f, "user-{id}"),
        }
    }
}

/// Updates pushed to room subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum RealtimeEvent {
    #[serde(rename = "session.attentionEvent.created")]
    AttentionEventCreated(AttentionEvent),

    #[serde(rename = "session.attentionSummary.updated")]
    AttentionSummaryUpdated(AttentionSummary),

    #[serde(rename = "session.phase.updated")]
    PhaseUpdated {
        session_id: String,
        phase: SessionPhase,
        previous_phase: SessionPhase,
        direction: TransitionDirection,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "session.attentionStatus.updated")]
    AttentionStatusUpdated {
        session_id: String,
        status: AttentionStatus,
        alerts: Vec<String>,
        scores: AttentionCounts,
    },

    #[serde(rename = "session.pedagogyStatus.updated")]
    PedagogyStatusUpdated {
        session_id: String,
        status: PedagogyStatus,
        alerts: Vec<String>,
    },

    #[serde(rename = "receiveMessage")]
    ChatMessage(ChatMessage),

    #[serde(rename = "pedagogy.alert")]
    PedagogyAlert {
        session_id: String,
        alerts: Vec<String>,
    },
}

impl RealtimeEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::AttentionEventCreated(_) => "session.attentionEvent.created",
            Self::AttentionSummaryUpdated(_) => "session.attentionSummary.updated",
            Self::PhaseUpdated { .. } => "session.phase.updated",
            Self::AttentionStatusUpdated { .. } => "session.attentionStatus.updated",
            Self::PedagogyStatusUpdated { .. } => "session.pedagogyStatus.updated",
            Self::ChatMessage(_) => "receiveMessage",
            Self::PedagogyAlert { .. } => "pedagogy.alert",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::AttentionEventCreated(event) => &event.session_id,
            Self::AttentionSummaryUpdated(summary) => &summary.session_id,
            Self::ChatMessage(message) => &message.session_id,
            Self::PhaseUpdated { session_id, .. }
            | Self::AttentionStatusUpdated { session_id, .. }
            | Self::PedagogyStatusUpdated { session_id, .. }
            | Self::PedagogyAlert { session_id, .. } => session_id,
        }
    }
}

/// One event as seen by a room subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub room: Room,
    /// Connection that caused the event, if any; it is not echoed back
    pub origin: Option<String>,
    pub event: RealtimeEvent,
}

impl Delivery {
    /// Whether a subscriber identified by `connection_id` should see this
    pub fn is_for(&self, connection_id: &str) -> bool {
        self.origin.as_deref() != Some(connection_id)
    }
}
