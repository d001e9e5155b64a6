//! Pure scoring functions over the ledger and phase history

pub mod rules;

pub use rules::{
    ATTENTION_RULES, AttentionVerdict, PEDAGOGY_RULES, PedagogyFacts, PedagogyVerdict, Rule,
    evaluate_attention_rules, evaluate_pedagogy_rules,
};
