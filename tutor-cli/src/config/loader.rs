use super::types::{
    DEFAULT_HOST, DEFAULT_PORT, RawEngineConfig, RawServerConfig, RawTutorConfig, ServerSection,
    TutorConfig,
};
use anyhow::Result;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tutor_core::EngineConfig;

/// Env var pointing at an alternate project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "TUTOR_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<TutorConfig> {
        let mut raw = RawTutorConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);

        Ok(Self::finalize(raw))
    }

    /// Load a single config file with defaults applied
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<TutorConfig> {
        Ok(Self::finalize(Self::read_raw(path)?))
    }

    /// Missing files read as empty
    fn read_raw(path: &Path) -> Result<RawTutorConfig> {
        if !path.exists() {
            return Ok(RawTutorConfig::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tutor").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with TUTOR_PROJECT_CONFIG_DIR
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".tutor/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawTutorConfig, overlay: RawTutorConfig) -> RawTutorConfig {
        RawTutorConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            engine: RawEngineConfig {
                room_capacity: overlay.engine.room_capacity.or(base.engine.room_capacity),
                evaluation_enabled: overlay
                    .engine
                    .evaluation_enabled
                    .or(base.engine.evaluation_enabled),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawTutorConfig) -> TutorConfig {
        let defaults = EngineConfig::default();
        TutorConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            engine: EngineConfig {
                room_capacity: raw
                    .engine
                    .room_capacity
                    .filter(|capacity| *capacity > 0)
                    .unwrap_or(defaults.room_capacity),
                evaluation_enabled: raw
                    .engine
                    .evaluation_enabled
                    .unwrap_or(defaults.evaluation_enabled),
            },
        }
    }
}
