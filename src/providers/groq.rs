//! Groq backend.

use std::time::Duration;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;

use super::classify::Classifier;
use super::{finish, ClientSettings, CommitProvider};
use crate::error::CommitError;
use crate::models::{GenerateOptions, ProviderType};
use crate::prompt::build_user_prompt;

pub struct GroqProvider {
    client: providers::groq::Client,
    api_key: String,
    model: String,
    timeout: Duration,
    classifier: Classifier,
}

impl std::fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GroqProvider {
    pub fn new(api_key: &str, settings: &ClientSettings) -> Result<Self, CommitError> {
        let kind = ProviderType::Groq;
        let model = kind.descriptor().default_model;

        let mut builder = providers::groq::Client::builder().api_key(api_key);
        if let Some(ref base_url) = settings.base_url {
            builder = builder.base_url(base_url);
        }
        let client: providers::groq::Client = build_client!(builder, kind)?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout: settings.timeout,
            classifier: Classifier::new(kind, model, settings.timeout),
        })
    }
}

#[async_trait]
impl CommitProvider for GroqProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Groq
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
        tracing::debug!(model = %self.model, "sending Groq chat completion request");

        let raw = prompt_commit!(self.client, &self.model, user_prompt.as_str(), self.timeout)
            .map_err(|failure| self.classifier.classify(failure, &self.api_key))?;
        finish(ProviderType::Groq, &raw)
    }
}
