//! Error types for tutor-core

use thiserror::Error;

/// Top-level error type for the pedagogy engine
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Malformed enum value or missing required field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown session
    #[error("Session not found: {0}")]
    NotFound(String),

    /// User is not a participant of the session
    #[error("User {user_id} has no access to session {session_id}")]
    Forbidden { session_id: String, user_id: String },

    /// Failure inside a background evaluator
    #[error("Evaluation of session {session_id} failed: {source}")]
    Evaluation {
        session_id: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Evaluation pipeline stopped")]
    PipelineStopped,

    /// Evaluation worker panicked or was cancelled
    #[error("Evaluation worker aborted: {0}")]
    WorkerAborted(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    /// Wrap an error raised while evaluating a session
    pub fn evaluation(session_id: impl Into<String>, source: EngineError) -> Self {
        Self::Evaluation {
            session_id: session_id.into(),
            source: Box::new(source),
        }
    }

    /// Short machine-readable code, used by the transport layers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Evaluation { .. } => "EVALUATION_FAILED",
            Self::PipelineStopped => "UNAVAILABLE",
            Self::WorkerAborted(_) => "EVALUATION_FAILED",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Errors raised by the persistence collaborator
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
