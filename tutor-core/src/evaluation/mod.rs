//! Evaluation pipeline: evaluators and the per-session orchestrator

mod evaluators;
mod orchestrator;

pub use evaluators::{AttentionEvaluation, EvaluationOutcome, PedagogyEvaluation};
pub use orchestrator::{EvaluationOrchestrator, Evaluator};
