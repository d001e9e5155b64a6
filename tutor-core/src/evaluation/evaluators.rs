//! The attention and pedagogy evaluators
//!
//! Both read current state, fold it through the rule tables and merge the
//! result into their own namespace of the session's derived fields. Running
//! either twice on the same state gives the same status and alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attention::AttentionCounts;
use crate::error::EngineError;
use crate::realtime::RealtimeEvent;
use crate::scoring::{PedagogyFacts, evaluate_attention_rules, evaluate_pedagogy_rules};
use crate::session::{AttentionMeta, AttentionStatus, DerivedUpdate, PedagogyMeta, PedagogyStatus};
use crate::store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionEvaluation {
    pub session_id: String,
    pub status: AttentionStatus,
    pub alerts: Vec<String>,
    pub scores: AttentionCounts,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedagogyEvaluation {
    pub session_id: String,
    pub status: PedagogyStatus,
    pub alerts: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
    /// Status before this pass
    #[serde(skip)]
    pub previous_status: PedagogyStatus,
    #[serde(skip)]
    pub tutor_id: String,
}

impl PedagogyEvaluation {
    /// Whether this pass moved the session into a gap
    pub fn opened_gap(&self) -> bool {
        self.status == PedagogyStatus::PedagogyGap
            && self.previous_status != PedagogyStatus::PedagogyGap
    }
}

/// Result of either evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Attention(AttentionEvaluation),
    Pedagogy(PedagogyEvaluation),
}

impl EvaluationOutcome {
    /// Status update to push to the session room
    pub fn to_realtime(&self) -> RealtimeEvent {
        match self {
            Self::Attention(eval) => RealtimeEvent::AttentionStatusUpdated {
                session_id: eval.session_id.clone(),
                status: eval.status,
                alerts: eval.alerts.clone(),
                scores: eval.scores,
            },
            Self::Pedagogy(eval) => RealtimeEvent::PedagogyStatusUpdated {
                session_id: eval.session_id.clone(),
                status: eval.status,
                alerts: eval.alerts.clone(),
            },
        }
    }
}

pub(crate) async fn evaluate_attention(
    store: &dyn SessionStore,
    session_id: &str,
) -> Result<AttentionEvaluation, EngineError> {
    let events = store.list_events(session_id).await?;
    let scores = AttentionCounts::from_events(&events);
    let verdict = evaluate_attention_rules(&scores);
    let evaluated_at = Utc::now();

    let update = DerivedUpdate::Attention {
        status: verdict.status,
        meta: AttentionMeta {
            alerts: verdict.alerts.clone(),
            last_evaluated: evaluated_at,
            scores,
        },
    };
    store.apply_derived(session_id, update).await?;

    debug!(
        session_id = %session_id,
        status = ?verdict.status,
        alerts = verdict.alerts.len(),
        "Attention evaluated"
    );

    Ok(AttentionEvaluation {
        session_id: session_id.to_string(),
        status: verdict.status,
        alerts: verdict.alerts,
        scores,
        evaluated_at,
    })
}

pub(crate) async fn evaluate_pedagogy(
    store: &dyn SessionStore,
    session_id: &str,
) -> Result<PedagogyEvaluation, EngineError> {
    let session = store.get_session(session_id).await?;
    let verdict = evaluate_pedagogy_rules(&PedagogyFacts::from_session(&session));
    let evaluated_at = Utc::now();

    let update = DerivedUpdate::Pedagogy {
        status: verdict.status,
        meta: PedagogyMeta {
            pedagogy_alerts: verdict.alerts.clone(),
            last_pedagogy_eval: evaluated_at,
        },
    };
    store.apply_derived(session_id, update).await?;

    debug!(
        session_id = %session_id,
        status = ?verdict.status,
        alerts = verdict.alerts.len(),
        "Pedagogy evaluated"
    );

    Ok(PedagogyEvaluation {
        session_id: session_id.to_string(),
        status: verdict.status,
        alerts: verdict.alerts,
        evaluated_at,
        previous_status: session.pedagogy_status,
        tutor_id: session.tutor_id,
    })
}
