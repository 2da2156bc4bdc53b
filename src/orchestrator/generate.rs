//! Generation: Idle → Generating → {Succeeded, Failed} → Idle.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;

use futures::FutureExt;

use super::Orchestrator;
use crate::error::{CommitError, ErrorCode};
use crate::git::GitError;
use crate::prompt::truncate_diff;
use crate::protocol::Event;

impl Orchestrator {
    /// Draft a commit message from the staged diff.
    ///
    /// A request arriving while another is in flight is ignored. Every
    /// accepted request publishes `loading: true` once and `loading: false`
    /// once, whatever happens in between.
    pub async fn generate(&self) {
        if self.inner.generating.swap(true, Ordering::SeqCst) {
            tracing::warn!("generation already in progress; ignoring request");
            return;
        }

        self.update_state(|s| {
            s.is_loading = true;
            s.error = None;
        })
        .await;
        self.publish(Event::Loading { is_loading: true });

        let outcome = AssertUnwindSafe(self.run_pipeline())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(CommitError::unknown(panic_message(panic.as_ref()))));

        match outcome {
            Ok(message) => {
                tracing::info!(chars = message.chars().count(), "commit message generated");
                self.update_state(|s| {
                    s.generated_message = Some(message.clone());
                    s.error = None;
                })
                .await;
                self.publish(Event::CommitGenerated { message });
            }
            Err(err) => {
                tracing::warn!(code = %err.code, retryable = err.retryable, "generation failed: {err}");
                self.update_state(|s| s.error = Some(err.message.clone())).await;
                self.publish(Event::from(err));
            }
        }

        self.update_state(|s| s.is_loading = false).await;
        // The guard stays held until `loading: false` is out, so a queued
        // request's `loading: true` can never precede it.
        self.publish(Event::Loading { is_loading: false });
        self.inner.generating.store(false, Ordering::SeqCst);
    }

    async fn run_pipeline(&self) -> Result<String, CommitError> {
        let config = self
            .deps()
            .settings
            .settings()
            .map_err(|e| CommitError::unknown(format!("Failed to load settings: {e}")))?;
        let provider_type = config.provider.name;

        let api_key = self
            .deps()
            .secrets
            .get(provider_type)
            .await
            .map_err(|e| {
                CommitError::unknown(format!("Failed to read API key: {e}")).with_provider(provider_type)
            })?
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CommitError::no_api_key(provider_type))?;

        let diff = self.deps().repository.staged_diff().await.map_err(|e| match e {
            GitError::NoRepository => CommitError::new(ErrorCode::NoGitRepo, "No repository found"),
            other => CommitError::unknown(format!("Failed to read staged changes: {other}")),
        })?;
        if diff.trim().is_empty() {
            return Err(CommitError::no_staged_changes());
        }

        let options = config.generate_options();
        let diff = truncate_diff(&diff, options.max_diff_size);
        let provider = self.deps().providers.create(provider_type, &api_key)?;

        tracing::info!(
            provider = %provider_type,
            model = provider.model(),
            diff_chars = diff.chars().count(),
            "requesting commit message"
        );
        provider.generate_commit_message(&diff, &options).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("Unexpected error: {detail}")
}
