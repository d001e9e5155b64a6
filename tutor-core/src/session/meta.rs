//! Evaluation metadata shared by the two evaluators
//!
//! Each evaluator owns one namespace. Writes replace only the writer's
//! namespace, so concurrent evaluators never clobber each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{AttentionStatus, PedagogyStatus};
use crate::attention::AttentionCounts;

/// Output of the attention evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionMeta {
    pub alerts: Vec<String>,
    pub last_evaluated: DateTime<Utc>,
    pub scores: AttentionCounts,
}

/// Output of the pedagogy evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedagogyMeta {
    pub pedagogy_alerts: Vec<String>,
    pub last_pedagogy_eval: DateTime<Utc>,
}

/// Per-evaluator derived metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention: Option<AttentionMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedagogy: Option<PedagogyMeta>,
}

impl EvaluationMeta {
    pub fn is_empty(&self) -> bool {
        self.attention.is_none() && self.pedagogy.is_none()
    }
}

/// One evaluator's write to the session's derived fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedUpdate {
    Attention {
        status: AttentionStatus,
        meta: AttentionMeta,
    },
    Pedagogy {
        status: PedagogyStatus,
        meta: PedagogyMeta,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attention_meta(at: DateTime<Utc>) -> AttentionMeta {
        AttentionMeta {
            alerts: vec![],
            last_evaluated: at,
            scores: AttentionCounts::default(),
        }
    }

    #[test]
    fn empty_meta_serializes_to_empty_object() {
        let json = serde_json::to_value(EvaluationMeta::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn namespaces_serialize_under_evaluator_keys() {
        let meta = EvaluationMeta {
            attention: Some(attention_meta(Utc::now())),
            pedagogy: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("attention").is_some());
        assert!(json.get("pedagogy").is_none());
    }
}
