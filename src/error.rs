//! Error taxonomy shared by providers, the factory and the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ProviderType;

/// Closed set of failure codes the presentation surface reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoApiKey,
    NoStagedChanges,
    NoGitRepo,
    ApiError,
    NetworkError,
    RateLimit,
    InvalidProvider,
    Unknown,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NoApiKey => "NO_API_KEY",
            ErrorCode::NoStagedChanges => "NO_STAGED_CHANGES",
            ErrorCode::NoGitRepo => "NO_GIT_REPO",
            ErrorCode::ApiError => "API_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::InvalidProvider => "INVALID_PROVIDER",
            ErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A classified failure.
///
/// `retryable` is advisory: nothing in the crate retries on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CommitError {
    pub message: String,
    pub code: ErrorCode,
    pub provider: Option<ProviderType>,
    pub retryable: bool,
}

impl CommitError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            provider: None,
            retryable: false,
        }
    }

    pub fn with_provider(mut self, provider: ProviderType) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn no_api_key(provider: ProviderType) -> Self {
        Self::new(
            ErrorCode::NoApiKey,
            format!("API key not set for {}", provider.label()),
        )
        .with_provider(provider)
    }

    pub fn no_staged_changes() -> Self {
        Self::new(ErrorCode::NoStagedChanges, "No staged changes")
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }
}
