//! Turning backend failures into the shared error taxonomy.
//!
//! rig reports failures as errors whose text carries the HTTP status
//! ("Invalid status code 429 ...") or the backend's JSON error body. Every
//! backend funnels them through a [`Classifier`]: the status decides first,
//! then the backend's error text, then the failure falls through to
//! `UNKNOWN`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use rig::completion::PromptError;

use crate::error::{CommitError, ErrorCode};
use crate::models::ProviderType;

const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please wait and try again.";
const INVALID_KEY_MESSAGE: &str = "Invalid API key";
const FALLBACK_MESSAGE: &str = "Failed to generate commit message";

const AUTH_MARKERS: &[&str] = &[
    "api_key",
    "api key",
    "invalid",
    "unauthorized",
    "unauthenticated",
    "permission_denied",
];
const RATE_MARKERS: &[&str] = &[
    "rate_limit",
    "rate limit",
    "too many requests",
    "resource_exhausted",
    "quota",
];
const NOT_FOUND_MARKERS: &[&str] = &["not found", "not_found"];
const NETWORK_MARKERS: &[&str] = &[
    "network",
    "connect",
    "sending request",
    "fetch",
    "timed out",
    "timeout",
    "dns",
];

static STATUS_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:invalid )?status code:?\s*(\d{3})").expect("status phrase pattern")
});

/// A raw failure as observed by a backend client.
#[derive(Debug)]
pub enum Failure {
    /// The backend answered with a non-success status.
    Status { status: StatusCode, body: String },
    /// No answer arrived within the request timeout.
    TimedOut,
    /// The request failed without a recognisable status.
    Malformed(String),
}

impl Failure {
    /// Recover the status from rig's error text, either from its
    /// "Invalid status code NNN" phrase or from a numeric `code` in an
    /// embedded error body.
    pub fn from_error_text(text: String) -> Self {
        let status = STATUS_PHRASE
            .captures(&text)
            .and_then(|c| c[1].parse::<u16>().ok())
            .or_else(|| embedded_status(&text))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .filter(|s| s.is_client_error() || s.is_server_error());
        match status {
            Some(status) => Self::Status { status, body: text },
            None => Self::Malformed(text),
        }
    }
}

impl From<PromptError> for Failure {
    fn from(err: PromptError) -> Self {
        Self::from_error_text(err.to_string())
    }
}

/// Billing exhaustion as reported by a backend.
#[derive(Debug, Clone, Copy)]
pub struct Billing {
    pub message: &'static str,
    pub markers: &'static [&'static str],
}

/// Per-backend classification rules.
#[derive(Debug, Clone)]
pub struct Classifier {
    provider: ProviderType,
    model: String,
    billing: Option<Billing>,
    timeout: Duration,
}

impl Classifier {
    pub fn new(provider: ProviderType, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            billing: None,
            timeout,
        }
    }

    pub fn with_billing(mut self, billing: Billing) -> Self {
        self.billing = Some(billing);
        self
    }

    /// Classify a failure. Any occurrence of `secret` in the resulting
    /// message is masked.
    pub fn classify(&self, failure: Failure, secret: &str) -> CommitError {
        let err = match failure {
            Failure::Status { status, body } => self.classify_status(status, &body),
            Failure::TimedOut => self
                .error(
                    ErrorCode::NetworkError,
                    format!(
                        "Network error: request to {} timed out after {}s",
                        self.label(),
                        self.timeout.as_secs()
                    ),
                )
                .retryable(),
            Failure::Malformed(detail) => {
                let detail = extract_error_message(&detail).unwrap_or(detail);
                self.classify_message(&detail)
            }
        };
        let err = CommitError {
            message: redact(&err.message, secret),
            ..err
        };
        tracing::debug!(
            provider = %self.provider,
            code = %err.code,
            retryable = err.retryable,
            "classified provider failure"
        );
        err
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> CommitError {
        let detail = extract_error_message(body).unwrap_or_else(|| body.to_string());
        let lowered = detail.to_lowercase();

        match status.as_u16() {
            401 | 403 => self.api_error(INVALID_KEY_MESSAGE),
            402 => match self.billing {
                Some(billing) => self.api_error(billing.message),
                None => self.api_error(format!("{} rejected the request: payment required", self.label())),
            },
            404 => self.model_not_found(),
            429 => match self.billing_hit(&lowered) {
                Some(message) => self.api_error(message),
                None => self.error(ErrorCode::RateLimit, RATE_LIMIT_MESSAGE).retryable(),
            },
            code if code >= 500 => self.api_error(format!("{} server error", self.label())).retryable(),
            _ => self.classify_message(&detail),
        }
    }

    fn classify_message(&self, detail: &str) -> CommitError {
        // rig's own "Invalid status code" wording must not read as a bad key.
        let detail = STATUS_PHRASE.replace_all(detail, "");
        let detail = detail.trim();
        let lowered = detail.to_lowercase();

        if let Some(message) = self.billing_hit(&lowered) {
            return self.api_error(message);
        }
        if contains_any(&lowered, AUTH_MARKERS) {
            return self.api_error(INVALID_KEY_MESSAGE);
        }
        if contains_any(&lowered, RATE_MARKERS) {
            return self.error(ErrorCode::RateLimit, RATE_LIMIT_MESSAGE).retryable();
        }
        if contains_any(&lowered, NOT_FOUND_MARKERS) {
            return self.model_not_found();
        }
        if contains_any(&lowered, NETWORK_MARKERS) {
            return self
                .error(ErrorCode::NetworkError, format!("Network error: {detail}"))
                .retryable();
        }
        self.error(ErrorCode::Unknown, FALLBACK_MESSAGE)
    }

    fn billing_hit(&self, lowered: &str) -> Option<&'static str> {
        self.billing
            .filter(|b| contains_any(lowered, b.markers))
            .map(|b| b.message)
    }

    fn model_not_found(&self) -> CommitError {
        self.api_error(format!("Model not found: {}", self.model))
    }

    fn api_error(&self, message: impl Into<String>) -> CommitError {
        self.error(ErrorCode::ApiError, message)
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> CommitError {
        CommitError::new(code, message).with_provider(self.provider)
    }

    fn label(&self) -> &'static str {
        self.provider.label()
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// The first JSON document embedded in `text`, unwrapping the
/// single-element array some Google endpoints return.
fn embedded_json(text: &str) -> Option<serde_json::Value> {
    let start = text.find(['{', '['])?;
    let value = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<serde_json::Value>()
        .next()?
        .ok()?;
    Some(match value {
        serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    })
}

/// Numeric `error.code` of an embedded error body (Google and OpenRouter).
fn embedded_status(text: &str) -> Option<u16> {
    let code = embedded_json(text)?.get("error")?.get("code")?.as_u64()?;
    u16::try_from(code).ok()
}

/// Pull the human-readable message out of a backend error body, alone or
/// embedded in an error's text.
///
/// Handles `{"error": {"message": ...}}`, `{"error": "..."}` and the
/// array-wrapped variant some Google endpoints return.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value = embedded_json(body)?;
    let error = value.get("error")?;
    if let Some(message) = error.as_str() {
        return Some(message.to_string());
    }
    let message = error.get("message")?.as_str()?;
    // OpenAI puts the machine-readable reason in `code`/`type`.
    let reason = error
        .get("code")
        .and_then(|c| c.as_str())
        .or_else(|| error.get("type").and_then(|t| t.as_str()))
        .or_else(|| error.get("status").and_then(|s| s.as_str()));
    Some(match reason {
        Some(reason) => format!("{message} ({reason})"),
        None => message.to_string(),
    })
}

/// Mask every occurrence of `secret` in `text`.
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "[REDACTED]")
}
