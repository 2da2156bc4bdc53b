//! Shared types used across all modules.
//!
//! Provider metadata, generation options, repository changes and the
//! session state snapshot live here so that providers, the orchestrator
//! and the wire protocol agree on one vocabulary.

pub mod change;
pub mod state;

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

pub use change::{ChangeStatus, FileChange};
pub use state::SessionState;

use crate::constants::DEFAULT_MAX_DIFF_SIZE;

/// Supported LLM backends. A closed set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    Groq,
    #[serde(rename = "openrouter")]
    OpenRouter,
}

/// Static metadata for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub label: &'static str,
    pub default_model: &'static str,
    /// Stable identifier the credential is stored under.
    pub secret_key: &'static str,
    /// Hint shown when prompting for the key.
    pub placeholder: &'static str,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Groq => write!(f, "groq"),
            ProviderType::OpenRouter => write!(f, "openrouter"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAI),
            "groq" => Ok(ProviderType::Groq),
            "openrouter" => Ok(ProviderType::OpenRouter),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: gemini, openai, groq, openrouter"
            )),
        }
    }
}

impl ProviderType {
    /// Every supported backend, in display order.
    pub fn all() -> impl Iterator<Item = ProviderType> {
        ProviderType::iter()
    }

    pub fn descriptor(self) -> ProviderDescriptor {
        match self {
            ProviderType::Gemini => ProviderDescriptor {
                label: "Google Gemini",
                default_model: "gemini-2.5-flash",
                secret_key: "cleancommit.geminiApiKey",
                placeholder: "AIza...",
            },
            ProviderType::OpenAI => ProviderDescriptor {
                label: "OpenAI",
                default_model: "gpt-4o-mini",
                secret_key: "cleancommit.openaiApiKey",
                placeholder: "sk-...",
            },
            ProviderType::Groq => ProviderDescriptor {
                label: "Groq",
                default_model: "llama-3.3-70b-versatile",
                secret_key: "cleancommit.groqApiKey",
                placeholder: "gsk_...",
            },
            ProviderType::OpenRouter => ProviderDescriptor {
                label: "OpenRouter",
                default_model: "google/gemini-2.0-flash-001",
                secret_key: "cleancommit.openrouterApiKey",
                placeholder: "sk-or-...",
            },
        }
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    /// Environment variable that overrides the stored credential.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderType::Gemini => "GEMINI_API_KEY",
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::Groq => "GROQ_API_KEY",
            ProviderType::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

/// Natural language the commit message is written in.
///
/// Unrecognized codes fall back to English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }

    /// Name used inside the prompt.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "es" => Language::Spanish,
            _ => Language::English,
        }
    }
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        Language::from_code(&code)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Configuration snapshot taken once per generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub language: Language,
    pub include_body: bool,
    pub max_diff_size: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            language: Language::English,
            include_body: false,
            max_diff_size: DEFAULT_MAX_DIFF_SIZE,
        }
    }
}
