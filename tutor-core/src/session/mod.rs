//! Session aggregate and its derived evaluation state

pub mod meta;
pub mod state;

pub use meta::{AttentionMeta, DerivedUpdate, EvaluationMeta, PedagogyMeta};
pub use state::{AttentionStatus, PedagogyStatus, Session, SessionStatus};
