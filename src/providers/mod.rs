//! CommitProvider trait, the provider factory, and the backends.
//!
//! Each backend is its own type behind the [`CommitProvider`] trait. The
//! factory is the single place a [`ProviderType`] turns into a concrete
//! client; nothing else switches on provider names.

/// Prompt a rig-core client once with the commit-message preamble and
/// request defaults, bounded by `$timeout`.
///
/// Evaluates to `Result<String, Failure>`.
macro_rules! prompt_commit {
    ($client:expr, $model:expr, $user:expr, $timeout:expr) => {{
        let agent = $client
            .agent($model)
            .preamble($crate::prompt::SYSTEM_PROMPT)
            .temperature(f64::from($crate::constants::TEMPERATURE))
            .max_tokens(u64::from($crate::constants::MAX_OUTPUT_TOKENS))
            .build();
        match tokio::time::timeout($timeout, agent.prompt($user)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err($crate::providers::classify::Failure::from(e)),
            Err(_) => Err($crate::providers::classify::Failure::TimedOut),
        }
    }};
}

/// Finish a rig client builder, mapping a construction failure.
macro_rules! build_client {
    ($builder:expr, $provider:expr) => {{
        $builder.build().map_err(|e| {
            $crate::error::CommitError::unknown(format!(
                "failed to create {} client: {e}",
                $provider.label()
            ))
            .with_provider($provider)
        })
    }};
}

pub mod classify;
pub mod gemini;
pub mod groq;
pub mod openai;
pub mod openrouter;

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::error::{CommitError, ErrorCode};
use crate::models::{GenerateOptions, ProviderType};

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use openai::OpenAIProvider;
pub use openrouter::OpenRouterProvider;

/// A backend able to turn a diff into a commit message.
///
/// Implementations send exactly one system and one user message, never
/// retry, and classify every failure into a [`CommitError`] carrying
/// their own [`ProviderType`].
#[async_trait]
pub trait CommitProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Display name of the backend.
    fn name(&self) -> &str {
        self.provider_type().label()
    }

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    async fn generate_commit_message(
        &self,
        diff: &str,
        options: &GenerateOptions,
    ) -> Result<String, CommitError>;
}

/// Builds a provider for a type and credential.
///
/// Construction performs no network I/O.
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        provider: ProviderType,
        api_key: &str,
    ) -> Result<Box<dyn CommitProvider>, CommitError>;
}

/// Endpoint and timeout shared by every HTTP backend.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    /// Replaces the backend's public API root, e.g. for a local mock server.
    pub base_url: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: None,
        }
    }
}

/// Production factory backed by rig-core clients.
#[derive(Debug, Clone, Default)]
pub struct HttpProviderFactory {
    timeout: Option<Duration>,
    base_urls: HashMap<ProviderType, String>,
}

impl HttpProviderFactory {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            base_urls: HashMap::new(),
        }
    }

    pub fn with_base_url(mut self, provider: ProviderType, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider, url.into());
        self
    }

    fn settings_for(&self, provider: ProviderType) -> ClientSettings {
        let defaults = ClientSettings::default();
        ClientSettings {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            base_url: self.base_urls.get(&provider).cloned(),
        }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        provider: ProviderType,
        api_key: &str,
    ) -> Result<Box<dyn CommitProvider>, CommitError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(CommitError::no_api_key(provider));
        }

        let settings = self.settings_for(provider);
        tracing::debug!(%provider, timeout = ?settings.timeout, "constructing provider");

        Ok(match provider {
            ProviderType::Gemini => Box::new(GeminiProvider::new(api_key, &settings)?),
            ProviderType::OpenAI => Box::new(OpenAIProvider::new(api_key, &settings)?),
            ProviderType::Groq => Box::new(GroqProvider::new(api_key, &settings)?),
            ProviderType::OpenRouter => Box::new(OpenRouterProvider::new(api_key, &settings)?),
        })
    }
}

/// Create a provider from an untyped provider name.
///
/// An empty key is rejected before the name is even looked at.
pub fn create_provider(
    factory: &dyn ProviderFactory,
    kind: &str,
    api_key: &str,
) -> Result<Box<dyn CommitProvider>, CommitError> {
    let parsed = kind.parse::<ProviderType>();

    if api_key.trim().is_empty() {
        return Err(match parsed {
            Ok(provider) => CommitError::no_api_key(provider),
            Err(_) => CommitError::new(
                ErrorCode::NoApiKey,
                format!("API key not configured for {kind}"),
            ),
        });
    }

    let provider = parsed.map_err(|_| {
        CommitError::new(ErrorCode::InvalidProvider, format!("Unknown provider: {kind}"))
    })?;
    factory.create(provider, api_key)
}

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```[a-z]*\n").expect("leading fence pattern"));
static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n```$").expect("trailing fence pattern"));

/// Clean a raw completion, rejecting one with nothing left.
fn finish(provider: ProviderType, raw: &str) -> Result<String, CommitError> {
    let message = clean_response(raw);
    if message.is_empty() {
        return Err(CommitError::unknown(format!("Empty response from {}", provider.label()))
            .with_provider(provider));
    }
    Ok(message)
}

/// Trim a raw completion and drop one surrounding code fence, if any.
pub fn clean_response(raw: &str) -> String {
    let text = raw.trim();
    let text = LEADING_FENCE.replace(text, "");
    let text = TRAILING_FENCE.replace(&text, "");
    text.trim().to_string()
}
