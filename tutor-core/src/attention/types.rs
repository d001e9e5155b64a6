//! Attention event type definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Kind of micro-interaction logged during a tutoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttentionEventType {
    CheckIn,
    Explanation,
    Response,
    Correction,
    Praise,
}

impl AttentionEventType {
    /// Every member of the enumeration, in canonical order
    pub const ALL: [AttentionEventType; 5] = [
        Self::CheckIn,
        Self::Explanation,
        Self::Response,
        Self::Correction,
        Self::Praise,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckIn => "CHECK_IN",
            Self::Explanation => "EXPLANATION",
            Self::Response => "RESPONSE",
            Self::Correction => "CORRECTION",
            Self::Praise => "PRAISE",
        }
    }

    /// Parse from the wire representation
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for AttentionEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttentionEventType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| EngineError::Validation(format!("unknown attention event type: {s}")))
    }
}

/// An immutable, timestamped interaction record owned by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionEvent {
    pub id: String,
    pub session_id: String,
    pub student_id: String,
    pub tutor_id: String,
    #[serde(rename = "type")]
    pub event_type: AttentionEventType,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an attention event
///
/// Identity fields are trusted as already validated by the caller; only
/// their presence is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttentionEvent {
    pub session_id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub event_type: AttentionEventType,
    pub metadata: Option<serde_json::Value>,
}

impl NewAttentionEvent {
    pub fn new(
        session_id: impl Into<String>,
        student_id: impl Into<String>,
        tutor_id: impl Into<String>,
        event_type: AttentionEventType,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            student_id: student_id.into(),
            tutor_id: tutor_id.into(),
            event_type,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check required fields and materialize the event
    ///
    /// Missing metadata becomes an empty object.
    pub fn into_event(self, created_at: DateTime<Utc>) -> Result<AttentionEvent, EngineError> {
        for (field, value) in [
            ("session_id", &self.session_id),
            ("student_id", &self.student_id),
            ("tutor_id", &self.tutor_id),
        ] {
            if value.trim().is_empty() {
                return Err(EngineError::Validation(format!("{field} is required")));
            }
        }

        let metadata = match self.metadata {
            None | Some(serde_json::Value::Null) => serde_json::Value::Object(Default::default()),
            Some(value) => value,
        };

        Ok(AttentionEvent {
            id: Uuid::new_v4().to_string(),
            session_id: self.session_id,
            student_id: self.student_id,
            tutor_id: self.tutor_id,
            event_type: self.event_type,
            metadata,
            created_at,
        })
    }
}
