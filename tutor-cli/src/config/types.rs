use serde::{Deserialize, Serialize};
use tutor_core::EngineConfig;

/// Default host for the tutor server
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the tutor server
pub const DEFAULT_PORT: u16 = tutor_server::DEFAULT_PORT;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTutorConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub engine: RawEngineConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    /// Host address to bind to
    pub host: Option<String>,

    /// Port for the tutor server
    pub port: Option<u16>,
}

/// Engine config as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEngineConfig {
    /// Broadcast buffer per real-time room
    pub room_capacity: Option<usize>,

    /// Run background evaluation after writes
    pub evaluation_enabled: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TutorConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
