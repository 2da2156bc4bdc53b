//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. Environment variables
//! 2. `.cleancommit.toml` in repo root
//! 3. `~/.config/cleancommit/config.toml` (global defaults)
//! 4. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    CONFIG_DIR, CONFIG_FILENAME, DEFAULT_MAX_DIFF_SIZE, DEFAULT_TIMEOUT_SECS, ENV_INCLUDE_BODY,
    ENV_LANGUAGE, ENV_MAX_DIFF_SIZE, ENV_PROVIDER, ENV_TIMEOUT,
};
use crate::env::Env;
use crate::models::{GenerateOptions, Language, ProviderType};

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub generation: GenerationConfig,
}

/// Which backend to call and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderType,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderType::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Shape of the generated message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub language: Language,
    pub include_body: bool,
    /// Characters of diff sent to the backend before truncation kicks in.
    pub max_diff_size: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            include_body: false,
            max_diff_size: DEFAULT_MAX_DIFF_SIZE,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(local_path) = repo_root.map(Self::repo_config_path) {
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);

        Ok(config)
    }

    /// Snapshot the options for one generation request.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            language: self.generation.language,
            include_body: self.generation.include_body,
            max_diff_size: self.generation.max_diff_size,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    /// Load a config from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
    }

    pub fn repo_config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(CONFIG_FILENAME)
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.timeout_secs != default_provider.timeout_secs {
            self.provider.timeout_secs = other.provider.timeout_secs;
        }

        let default_generation = GenerationConfig::default();
        if other.generation.language != default_generation.language {
            self.generation.language = other.generation.language;
        }
        if other.generation.include_body {
            self.generation.include_body = true;
        }
        if other.generation.max_diff_size != default_generation.max_diff_size {
            self.generation.max_diff_size = other.generation.max_diff_size;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(val) = env.var(ENV_PROVIDER) {
            match val.parse::<ProviderType>() {
                Ok(name) => self.provider.name = name,
                Err(_) => tracing::warn!("ignoring invalid {ENV_PROVIDER} value: {val}"),
            }
        }
        if let Ok(val) = env.var(ENV_LANGUAGE) {
            self.generation.language = Language::from_code(&val);
        }
        if let Ok(val) = env.var(ENV_MAX_DIFF_SIZE) {
            match val.trim().parse::<usize>() {
                Ok(size) => self.generation.max_diff_size = size,
                Err(_) => tracing::warn!("ignoring invalid {ENV_MAX_DIFF_SIZE} value: {val}"),
            }
        }
        if let Ok(val) = env.var(ENV_TIMEOUT) {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.provider.timeout_secs = secs,
                _ => tracing::warn!("ignoring invalid {ENV_TIMEOUT} value: {val}"),
            }
        }
        if let Ok(val) = env.var(ENV_INCLUDE_BODY) {
            match val.to_lowercase().as_str() {
                "false" | "0" | "no" | "off" => self.generation.include_body = false,
                "true" | "1" | "yes" | "on" => self.generation.include_body = true,
                _ => tracing::warn!("ignoring invalid {ENV_INCLUDE_BODY} value: {val}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.provider.name, ProviderType::Gemini);
        assert_eq!(config.provider.timeout_secs, 60);
        assert_eq!(config.generation.language, Language::English);
        assert!(!config.generation.include_body);
        assert_eq!(config.generation.max_diff_size, 4000);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[provider]
name = "openrouter"
timeout_secs = 30

[generation]
language = "es"
include_body = true
max_diff_size = 8000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.name, ProviderType::OpenRouter);
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.generation.language, Language::Spanish);
        assert!(config.generation.include_body);
        assert_eq!(config.generation.max_diff_size, 8000);
    }

    #[test]
    fn unknown_language_in_file_falls_back_to_english() {
        let config: Config = toml::from_str("[generation]\nlanguage = \"fr\"\n").unwrap();
        assert_eq!(config.generation.language, Language::English);
    }

    #[test]
    fn unknown_provider_in_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[provider]\nname = \"bogus\"\n").unwrap();
        let err = Config::load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn merge_overrides_non_default_values() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.provider.name = ProviderType::Groq;
        other.provider.timeout_secs = 15;
        other.generation.language = Language::Spanish;
        other.generation.include_body = true;
        other.generation.max_diff_size = 1000;

        base.merge(other.clone());
        assert_eq!(base, other);
    }

    #[test]
    fn merge_keeps_values_when_other_is_default() {
        let mut base = Config::default();
        base.provider.name = ProviderType::OpenAI;
        base.generation.max_diff_size = 2000;

        base.merge(Config::default());
        assert_eq!(base.provider.name, ProviderType::OpenAI);
        assert_eq!(base.generation.max_diff_size, 2000);
    }

    #[test]
    fn repo_file_cannot_reset_a_value_to_its_default() {
        let dir = tempfile::tempdir().unwrap();
        let repo_file = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &repo_file,
            "[provider]\nname = \"gemini\"\n[generation]\ninclude_body = false\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.provider.name = ProviderType::OpenAI;
        config.generation.include_body = true;
        config.merge(Config::load_file(&repo_file).unwrap());
        assert_eq!(config.provider.name, ProviderType::OpenAI);
        assert!(config.generation.include_body);

        // Environment variables are applied as-is, defaults included.
        config.apply_env_vars(&Env::from_pairs([(ENV_PROVIDER, "gemini"), (ENV_INCLUDE_BODY, "false")]));
        assert_eq!(config.provider.name, ProviderType::Gemini);
        assert!(!config.generation.include_body);
    }

    #[test]
    fn repo_file_is_layered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "[provider]\nname = \"openai\"\n[generation]\nmax_diff_size = 1234\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), &Env::from_pairs(Vec::<(String, String)>::new())).unwrap();
        assert_eq!(config.provider.name, ProviderType::OpenAI);
        assert_eq!(config.generation.max_diff_size, 1234);
    }

    #[test]
    fn env_vars_override_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "[provider]\nname = \"openai\"\n").unwrap();

        let env = Env::from_pairs([
            (ENV_PROVIDER, "groq"),
            (ENV_LANGUAGE, "es"),
            (ENV_MAX_DIFF_SIZE, "500"),
            (ENV_INCLUDE_BODY, "yes"),
            (ENV_TIMEOUT, "10"),
        ]);
        let config = Config::load(Some(dir.path()), &env).unwrap();
        assert_eq!(config.provider.name, ProviderType::Groq);
        assert_eq!(config.generation.language, Language::Spanish);
        assert_eq!(config.generation.max_diff_size, 500);
        assert!(config.generation.include_body);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let env = Env::from_pairs([
            (ENV_PROVIDER, "bogus"),
            (ENV_MAX_DIFF_SIZE, "lots"),
            (ENV_INCLUDE_BODY, "maybe"),
            (ENV_TIMEOUT, "0"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn generate_options_snapshot() {
        let mut config = Config::default();
        config.generation.include_body = true;
        let opts = config.generate_options();
        assert!(opts.include_body);
        assert_eq!(opts.max_diff_size, 4000);
        assert_eq!(opts.language, Language::English);
    }
}
