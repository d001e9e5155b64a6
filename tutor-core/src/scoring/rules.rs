//! Rule tables for the attention and pedagogy evaluators
//!
//! Each evaluator is a fold over a fixed table. Every rule is checked; the
//! alert list keeps every firing rule's message in table order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::attention::AttentionCounts;
use crate::phase::SessionPhase;
use crate::session::{AttentionStatus, PedagogyStatus, Session, SessionStatus};

/// Minimum RESPONSE events before engagement counts as healthy
pub const MIN_RESPONSE_LOOPS: u32 = 3;

/// A single rule: when `fires` holds, raise `alert` and move to `status_on_fire`
pub struct Rule<F, S> {
    pub name: &'static str,
    pub alert: &'static str,
    pub status_on_fire: S,
    pub fires: fn(&F) -> bool,
}

/// Fold `facts` over `rules`, starting from `healthy`
fn apply<F, S: Copy>(rules: &[Rule<F, S>], facts: &F, healthy: S) -> (S, Vec<String>) {
    rules
        .iter()
        .filter(|rule| (rule.fires)(facts))
        .fold((healthy, Vec::new()), |(_, mut alerts), rule| {
            alerts.push(rule.alert.to_string());
            (rule.status_on_fire, alerts)
        })
}

// ============================================================================
// Attention
// ============================================================================

pub static ATTENTION_RULES: [Rule<AttentionCounts, AttentionStatus>; 3] = [
    Rule {
        name: "missing_check_in",
        alert: "No CHECK_IN loop detected",
        status_on_fire: AttentionStatus::LowPersonalization,
        fires: |c| c.check_in == 0,
    },
    Rule {
        name: "low_response_loops",
        alert: "Low engagement: Student response loops < 3",
        status_on_fire: AttentionStatus::LowPersonalization,
        fires: |c| c.response < MIN_RESPONSE_LOOPS,
    },
    Rule {
        name: "missing_praise",
        alert: "Missing positive reinforcement (PRAISE)",
        status_on_fire: AttentionStatus::LowPersonalization,
        fires: |c| c.praise == 0,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionVerdict {
    pub status: AttentionStatus,
    pub alerts: Vec<String>,
}

pub fn evaluate_attention_rules(counts: &AttentionCounts) -> AttentionVerdict {
    let (status, alerts) = apply(&ATTENTION_RULES, counts, AttentionStatus::Healthy);
    AttentionVerdict { status, alerts }
}

// ============================================================================
// Pedagogy
// ============================================================================

/// What the pedagogy rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedagogyFacts {
    pub visited: HashSet<SessionPhase>,
    pub status: SessionStatus,
}

impl PedagogyFacts {
    pub fn from_session(session: &Session) -> Self {
        Self {
            visited: session.phase_history.iter().map(|e| e.phase).collect(),
            status: session.status,
        }
    }

    pub fn visited(&self, phase: SessionPhase) -> bool {
        self.visited.contains(&phase)
    }
}

pub static PEDAGOGY_RULES: [Rule<PedagogyFacts, PedagogyStatus>; 3] = [
    Rule {
        name: "missing_warm_connect",
        alert: "Session did not experience Warm Connect phase",
        status_on_fire: PedagogyStatus::PedagogyGap,
        fires: |f| !f.visited(SessionPhase::WarmConnect),
    },
    Rule {
        name: "teach_without_response",
        alert: "Instruction (Teach) phase active without student response loops",
        status_on_fire: PedagogyStatus::PedagogyGap,
        fires: |f| f.visited(SessionPhase::MicroTeach) && !f.visited(SessionPhase::ActiveResponse),
    },
    Rule {
        name: "completed_without_reflect",
        alert: "Session ended without Reflection phase",
        status_on_fire: PedagogyStatus::PedagogyGap,
        fires: |f| f.status == SessionStatus::Completed && !f.visited(SessionPhase::Reflect),
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedagogyVerdict {
    pub status: PedagogyStatus,
    pub alerts: Vec<String>,
}

pub fn evaluate_pedagogy_rules(facts: &PedagogyFacts) -> PedagogyVerdict {
    let (status, alerts) = apply(&PEDAGOGY_RULES, facts, PedagogyStatus::Healthy);
    PedagogyVerdict { status, alerts }
}
