//! Shared application state for the tutor server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tutor_core::{EngineConfig, PedagogyEngine};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The session pedagogy engine
    pub engine: Arc<PedagogyEngine>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState with a default engine
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Create a new AppState with a configured engine
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_engine(Arc::new(PedagogyEngine::new(config)))
    }

    /// Create AppState around an existing engine (for testing)
    pub fn with_engine(engine: Arc<PedagogyEngine>) -> Self {
        Self {
            engine,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
