//! Configuration loading and layering.
//!
//! Handles `.cleancommit.toml` loading and environment variable
//! resolution. The orchestrator reads settings through [`SettingsSource`]
//! so every request sees the configuration as it is right now.

pub mod loader;

use std::path::PathBuf;

pub use loader::{Config, ConfigError, GenerationConfig, ProviderConfig};

use crate::env::Env;

/// Where the orchestrator gets its settings from.
pub trait SettingsSource: Send + Sync {
    fn settings(&self) -> Result<Config, ConfigError>;
}

/// A fixed configuration.
impl SettingsSource for Config {
    fn settings(&self) -> Result<Config, ConfigError> {
        Ok(self.clone())
    }
}

/// Global file, repo file and environment, re-read on every call.
#[derive(Debug, Clone)]
pub struct LayeredSettings {
    repo_root: Option<PathBuf>,
    env: Env,
}

impl LayeredSettings {
    pub fn new(repo_root: Option<PathBuf>, env: Env) -> Self {
        Self { repo_root, env }
    }

    /// Config files that contribute to the result, in priority order
    /// (lowest first). Files need not exist.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Config::global_config_path().into_iter().collect();
        if let Some(root) = &self.repo_root {
            files.push(Config::repo_config_path(root));
        }
        files
    }
}

impl SettingsSource for LayeredSettings {
    fn settings(&self) -> Result<Config, ConfigError> {
        Config::load(self.repo_root.as_deref(), &self.env)
    }
}
