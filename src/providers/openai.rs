//! OpenAI backend, over the chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;

use super::classify::{Billing, Classifier};
use super::{finish, ClientSettings, CommitProvider};
use crate::error::CommitError;
use crate::models::{GenerateOptions, ProviderType};
use crate::prompt::build_user_prompt;

const BILLING: Billing = Billing {
    message: "No API credits available. Please add credits at platform.openai.com/account/billing",
    markers: &["insufficient_quota", "billing", "quota"],
};

pub struct OpenAIProvider {
    client: providers::openai::CompletionsClient,
    api_key: String,
    model: String,
    timeout: Duration,
    classifier: Classifier,
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAIProvider {
    pub fn new(api_key: &str, settings: &ClientSettings) -> Result<Self, CommitError> {
        let kind = ProviderType::OpenAI;
        let model = kind.descriptor().default_model;

        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(ref base_url) = settings.base_url {
            builder = builder.base_url(base_url);
        }
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
impl CommitProvider for OpenAIProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAI
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
        tracing::debug!(model = %self.model, "sending OpenAI chat completion request");

        let raw = prompt_commit!(self.client, &self.model, user_prompt.as_str(), self.timeout)
            .map_err(|failure| self.classifier.classify(failure, &self.api_key))?;
        finish(ProviderType::OpenAI, &raw)
    }
}
