//! Reduction of an event ledger into counters and a personalization score

use serde::{Deserialize, Serialize};

use super::types::{AttentionEvent, AttentionEventType};

/// Points awarded per distinct event type present
const POINTS_PER_TYPE: u32 = 10;
/// Points awarded per recorded event
const POINTS_PER_EVENT: u32 = 2;
/// Ceiling for the volume term
const VOLUME_CAP: u32 = 50;
/// Ceiling for the whole score
const SCORE_CAP: u32 = 100;

/// Per-type event counts, zero-filled for absent types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AttentionCounts {
    pub check_in: u32,
    pub explanation: u32,
    pub response: u32,
    pub correction: u32,
    pub praise: u32,
}

impl AttentionCounts {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a AttentionEvent>) -> Self {
        let mut counts = Self::default();
        for event in events {
            counts.record(event.event_type);
        }
        counts
    }

    /// Count one more event of the given type
    pub fn record(&mut self, event_type: AttentionEventType) {
        *self.slot_mut(event_type) += 1;
    }

    pub fn get(&self, event_type: AttentionEventType) -> u32 {
        match event_type {
            AttentionEventType::CheckIn => self.check_in,
            AttentionEventType::Explanation => self.explanation,
            AttentionEventType::Response => self.response,
            AttentionEventType::Correction => self.correction,
            AttentionEventType::Praise => self.praise,
        }
    }

    fn slot_mut(&mut self, event_type: AttentionEventType) -> &mut u32 {
        match event_type {
            AttentionEventType::CheckIn => &mut self.check_in,
            AttentionEventType::Explanation => &mut self.explanation,
            AttentionEventType::Response => &mut self.response,
            AttentionEventType::Correction => &mut self.correction,
            AttentionEventType::Praise => &mut self.praise,
        }
    }

    pub fn total(&self) -> u32 {
        AttentionEventType::ALL.iter().map(|t| self.get(*t)).sum()
    }

    /// Number of event types seen at least once
    pub fn unique_types(&self) -> u32 {
        AttentionEventType::ALL
            .iter()
            .filter(|t| self.get(**t) > 0)
            .count() as u32
    }

    /// True iff every event type has been seen
    pub fn loops_complete(&self) -> bool {
        self.unique_types() == AttentionEventType::ALL.len() as u32
    }
}

/// Breadth plus volume heuristic, 0..=100
///
/// `min(100, unique_types * 10 + min(total * 2, 50))`
pub fn personalization_score(counts: &AttentionCounts) -> u32 {
    let breadth = counts.unique_types() * POINTS_PER_TYPE;
    let volume = counts.total().saturating_mul(POINTS_PER_EVENT).min(VOLUME_CAP);
    (breadth + volume).min(SCORE_CAP)
}

/// Per-session attention summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionSummary {
    pub session_id: String,
    pub counts: AttentionCounts,
    pub total_events: u32,
    pub loops_complete: bool,
    pub personalization_score: u32,
}

impl AttentionSummary {
    pub fn from_events<'a>(
        session_id: impl Into<String>,
        events: impl IntoIterator<Item = &'a AttentionEvent>,
    ) -> Self {
        let counts = AttentionCounts::from_events(events);
        Self {
            session_id: session_id.into(),
            counts,
            total_events: counts.total(),
            loops_complete: counts.loops_complete(),
            personalization_score: personalization_score(&counts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts_of(types: &[AttentionEventType]) -> AttentionCounts {
        let mut counts = AttentionCounts::default();
        for t in types {
            counts.record(*t);
        }
        counts
    }

    // ==================== Counting Tests ====================

    #[test]
    fn empty_ledger_is_zero_filled() {
        let counts = AttentionCounts::default();
        for t in AttentionEventType::ALL {
            assert_eq!(counts.get(t), 0);
        }
        assert!(!counts.loops_complete());
    }

    #[test]
    fn duplicates_are_counted() {
        use AttentionEventType::*;
        let counts = counts_of(&[Response, Response, Response, Praise]);
        assert_eq!(counts.response, 3);
        assert_eq!(counts.praise, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.unique_types(), 2);
    }

    #[test]
    fn loops_complete_requires_every_type() {
        use AttentionEventType::*;
        let partial = counts_of(&[CheckIn, Explanation, Response, Correction]);
        assert!(!partial.loops_complete());

        let full = counts_of(&[CheckIn, Explanation, Response, Correction, Praise]);
        assert!(full.loops_complete());
    }

    #[test]
    fn counts_serialize_with_wire_names() {
        let json = serde_json::to_value(counts_of(&[AttentionEventType::CheckIn])).unwrap();
        assert_eq!(json["CHECK_IN"], 1);
        assert_eq!(json["PRAISE"], 0);
    }

    // ==================== Score Tests ====================

    #[test]
    fn score_of_empty_ledger_is_zero() {
        assert_eq!(personalization_score(&AttentionCounts::default()), 0);
    }

    #[test]
    fn score_blends_breadth_and_volume() {
        use AttentionEventType::*;
        // 2 types * 10 + 3 events * 2
        let counts = counts_of(&[CheckIn, CheckIn, Praise]);
        assert_eq!(personalization_score(&counts), 26);
    }

    #[test]
    fn volume_term_saturates_at_fifty() {
        let counts = counts_of(&[AttentionEventType::Response; 40]);
        // 1 type * 10 + min(80, 50)
        assert_eq!(personalization_score(&counts), 60);
    }

    #[test]
    fn all_types_and_twenty_five_events_scores_one_hundred() {
        let mut types = AttentionEventType::ALL.to_vec();
        types.extend(std::iter::repeat_n(AttentionEventType::Response, 20));
        let counts = counts_of(&types);

        assert_eq!(counts.total(), 25);
        assert!(counts.loops_complete());
        assert_eq!(personalization_score(&counts), 100);
    }

    #[test]
    fn score_never_decreases_on_append() {
        let sequence = [
            AttentionEventType::Response,
            AttentionEventType::Response,
            AttentionEventType::CheckIn,
            AttentionEventType::Praise,
            AttentionEventType::Explanation,
            AttentionEventType::Correction,
        ];

        let mut counts = AttentionCounts::default();
        let mut last = personalization_score(&counts);
        for t in sequence.iter().cycle().take(60) {
            counts.record(*t);
            let score = personalization_score(&counts);
            assert!(score >= last, "score dropped from {last} to {score}");
            assert!(score <= 100);
            last = score;
        }
    }

    #[test]
    fn summary_reports_totals() {
        let summary = AttentionSummary::from_events("s1", std::iter::empty());
        assert_eq!(summary.session_id, "s1");
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.personalization_score, 0);
        assert!(!summary.loops_complete);
    }
}
