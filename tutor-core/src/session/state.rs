//! Session struct and derived status enums

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::meta::{DerivedUpdate, EvaluationMeta};
use crate::phase::{PhaseHistoryEntry, PhaseTransition, SessionPhase, plan_transition};

/// Lifecycle of the session itself, owned outside the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived from the attention ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttentionStatus {
    #[default]
    Healthy,
    LowPersonalization,
}

/// Derived from the phase history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PedagogyStatus {
    #[default]
    Healthy,
    PedagogyGap,
}

/// The aggregate the engine mutates
///
/// Attention events live beside the session in the store; the phase history
/// is carried inline because every transition rewrites `current_phase` with
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub status: SessionStatus,
    pub current_phase: SessionPhase,
    pub phase_history: Vec<PhaseHistoryEntry>,
    pub attention_status: AttentionStatus,
    pub pedagogy_status: PedagogyStatus,
    pub evaluation_meta: EvaluationMeta,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        student_id: impl Into<String>,
        tutor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            tutor_id: tutor_id.into(),
            status: SessionStatus::default(),
            current_phase: SessionPhase::INITIAL,
            phase_history: Vec::new(),
            attention_status: AttentionStatus::default(),
            pedagogy_status: PedagogyStatus::default(),
            evaluation_meta: EvaluationMeta::default(),
            created_at: Utc::now(),
        }
    }

    /// Whether the user takes part in this session
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.student_id == user_id || self.tutor_id == user_id
    }

    /// Move to in progress, recording the opening phase if nothing has been
    /// recorded yet
    pub fn start(&mut self, started_at: DateTime<Utc>) {
        self.status = SessionStatus::InProgress;
        if self.phase_history.is_empty() {
            let opening = plan_transition(self.current_phase, self.current_phase);
            self.apply_transition(&opening, started_at);
        }
    }

    /// Append the transition to the history and move to its target
    pub fn apply_transition(&mut self, transition: &PhaseTransition, started_at: DateTime<Utc>) {
        self.phase_history.push(transition.entry(started_at));
        self.current_phase = transition.to;
    }

    /// Start time of the most recent transition
    pub fn last_transition_at(&self) -> Option<DateTime<Utc>> {
        self.phase_history.last().map(|entry| entry.started_at)
    }

    /// Write one evaluator's derived fields
    pub fn apply_derived(&mut self, update: DerivedUpdate) {
        match update {
            DerivedUpdate::Attention { status, meta } => {
                self.attention_status = status;
                self.evaluation_meta.attention = Some(meta);
            }
            DerivedUpdate::Pedagogy { status, meta } => {
                self.pedagogy_status = status;
                self.evaluation_meta.pedagogy = Some(meta);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attention::AttentionCounts;
    use crate::phase::TransitionDirection;
    use crate::session::{AttentionMeta, PedagogyMeta};

    #[test]
    fn new_session_starts_at_initial_phase() {
        let session = Session::new("s1", "stu", "tut");

        assert_eq!(session.current_phase, SessionPhase::WarmConnect);
        assert!(session.phase_history.is_empty());
        assert_eq!(session.status, SessionStatus::Scheduled);
        assert_eq!(session.attention_status, AttentionStatus::Healthy);
        assert_eq!(session.pedagogy_status, PedagogyStatus::Healthy);
    }

    #[test]
    fn participants_are_student_and_tutor() {
        let session = Session::new("s1", "stu", "tut");
        assert!(session.is_participant("stu"));
        assert!(session.is_participant("tut"));
        assert!(!session.is_participant("someone-else"));
    }

    #[test]
    fn first_transition_records_initial_phase_as_previous() {
        let mut session = Session::new("s1", "stu", "tut");
        let transition = plan_transition(session.current_phase, SessionPhase::Diagnose);
        session.apply_transition(&transition, Utc::now());

        assert_eq!(session.phase_history.len(), 1);
        assert_eq!(session.phase_history[0].previous_phase, SessionPhase::INITIAL);
        assert_eq!(session.current_phase, SessionPhase::Diagnose);
    }

    #[test]
    fn start_records_opening_phase_once() {
        let mut session = Session::new("s1", "stu", "tut");
        let started_at = Utc::now();
        session.start(started_at);
        session.start(Utc::now());

        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.phase_history.len(), 1);
        let opening = &session.phase_history[0];
        assert_eq!(opening.phase, SessionPhase::WarmConnect);
        assert_eq!(opening.previous_phase, SessionPhase::WarmConnect);
        assert_eq!(opening.started_at, started_at);
        assert_eq!(session.current_phase, SessionPhase::WarmConnect);
    }

    #[test]
    fn start_keeps_history_recorded_before_it() {
        let mut session = Session::new("s1", "stu", "tut");
        let transition = plan_transition(session.current_phase, SessionPhase::Diagnose);
        assert_eq!(transition.direction, TransitionDirection::Forward);
        session.apply_transition(&transition, Utc::now());
        session.start(Utc::now());

        assert_eq!(session.phase_history.len(), 1);
        assert_eq!(session.current_phase, SessionPhase::Diagnose);
    }

    #[test]
    fn derived_updates_keep_the_other_namespace() {
        let mut session = Session::new("s1", "stu", "tut");
        let now = Utc::now();

        session.apply_derived(DerivedUpdate::Attention {
            status: AttentionStatus::LowPersonalization,
            meta: AttentionMeta {
                alerts: vec!["No CHECK_IN loop detected".to_string()],
                last_evaluated: now,
                scores: AttentionCounts::default(),
            },
        });
        session.apply_derived(DerivedUpdate::Pedagogy {
            status: PedagogyStatus::PedagogyGap,
            meta: PedagogyMeta {
                pedagogy_alerts: vec!["gap".to_string()],
                last_pedagogy_eval: now,
            },
        });

        assert_eq!(session.attention_status, AttentionStatus::LowPersonalization);
        assert_eq!(session.pedagogy_status, PedagogyStatus::PedagogyGap);
        assert!(session.evaluation_meta.attention.is_some());
        assert!(session.evaluation_meta.pedagogy.is_some());
    }

    #[test]
    fn statuses_serialize_with_wire_names() {
        assert_eq!(
            serde_json::to_string(&AttentionStatus::LowPersonalization).unwrap(),
            "\"LOW_PERSONALIZATION\""
        );
        assert_eq!(
            serde_json::to_string(&PedagogyStatus::PedagogyGap).unwrap(),
            "\"PEDAGOGY_GAP\""
        );
        assert_eq!(
            serde_json::to_string(&SessionStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
