//! OpenRouter backend.
//!
//! Routes to many upstream models through one OpenAI-compatible API, so it
//! rides on rig's OpenAI chat-completions client with its own base URL.
//! OpenRouter asks callers to identify themselves with a referer and title.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;

use super::classify::{Billing, Classifier};
use super::{finish, ClientSettings, CommitProvider};
use crate::constants::{APP_TITLE, HOMEPAGE_URL};
use crate::error::CommitError;
use crate::models::{GenerateOptions, ProviderType};
use crate::prompt::build_user_prompt;

const API_BASE: &str = "https://openrouter.ai/api/v1";

const BILLING: Billing = Billing {
    message: "No credits available. Please add credits at openrouter.ai",
    markers: &["insufficient", "billing", "quota", "credits"],
};

pub struct OpenRouterProvider {
    client: providers::openai::CompletionsClient,
    api_key: String,
    model: String,
    timeout: Duration,
    classifier: Classifier,
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

fn attribution_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("http-referer", HeaderValue::from_static(HOMEPAGE_URL));
    headers.insert("x-title", HeaderValue::from_static(APP_TITLE));
    headers
}

impl OpenRouterProvider {
    pub fn new(api_key: &str, settings: &ClientSettings) -> Result<Self, CommitError> {
        let kind = ProviderType::OpenRouter;
        let model = kind.descriptor().default_model;
        let base_url = settings.base_url.as_deref().unwrap_or(API_BASE);

        let builder = providers::openai::CompletionsClient::builder()
            .api_key(api_key)
            .base_url(base_url)
            .http_headers(attribution_headers());
        let client: providers::openai::CompletionsClient = build_client!(builder, kind)?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout: settings.timeout,
            classifier: Classifier::new(kind, model, settings.timeout).with_billing(BILLING),
        })
    }
}

#[async_trait]
impl CommitProvider for OpenRouterProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenRouter
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_commit_message(
        &self,
        diff: &str,
        options: &GenerateOptions,
    ) -> Result<String, CommitError> {
        let user_prompt = build_user_prompt(diff, options);
        tracing::debug!(model = %self.model, "sending OpenRouter chat completion request");

        let raw = prompt_commit!(self.client, &self.model, user_prompt.as_str(), self.timeout)
            .map_err(|failure| self.classifier.classify(failure, &self.api_key))?;
        finish(ProviderType::OpenRouter, &raw)
    }
}
