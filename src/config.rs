use crate::errors::ConfigError;
use crate::validator::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/arena.ron";

/// Arena and demo settings, loadable from RON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ArenaConfig {
    pub validator: ValidatorConfig,
    /// Global effect ids attached to every battle at start
    pub ruleset: Vec<String>,
    /// Number of bot battles the demo binary runs
    pub battles: usize,
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            validator: ValidatorConfig::default(),
            ruleset: vec!["StaminaRegen".to_string()],
            battles: 4,
            log_filter: "info".to_string(),
        }
    }
}

impl ArenaConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }
}
