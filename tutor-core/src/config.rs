//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::realtime::DEFAULT_ROOM_CAPACITY;

/// Tunables for the pedagogy engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Broadcast buffer per real-time room
    pub room_capacity: usize,
    /// Run background evaluation after writes
    pub evaluation_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            room_capacity: DEFAULT_ROOM_CAPACITY,
            evaluation_enabled: true,
        }
    }
}
