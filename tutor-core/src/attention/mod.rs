//! Attention event ledger types and summaries

pub mod summary;
pub mod types;

pub use summary::{AttentionCounts, AttentionSummary, personalization_score};
pub use types::{AttentionEvent, AttentionEventType, NewAttentionEvent};
