//! Repository proxy operations and change broadcasts.

use std::future::Future;
use std::path::PathBuf;

use super::Orchestrator;
use crate::git::GitError;
use crate::models::FileChange;
use crate::protocol::Event;

const DISCARD_ACTION: &str = "Discard";
const DISCARD_ALL_PROMPT: &str = "Discard all changes? This cannot be undone.";

impl Orchestrator {
    /// Re-read both change lists and publish them.
    ///
    /// Outside a repository both lists are empty.
    pub async fn refresh_changes(&self) {
        let (changes, staged) = changes_or_empty(self.deps().repository.changes().await);

        let has_staged = !staged.is_empty();
        self.update_state(|s| s.has_staged_changes = has_staged).await;
        self.publish(Event::ChangesUpdated { changes, staged });
    }

    pub async fn stage_all(&self) {
        self.proxy("Failed to stage changes", self.deps().repository.stage_all())
            .await;
    }

    pub async fn unstage_all(&self) {
        self.proxy("Failed to unstage changes", self.deps().repository.unstage_all())
            .await;
    }

    pub async fn discard_all(&self) {
        if !self.deps().host.confirm(DISCARD_ALL_PROMPT, DISCARD_ACTION).await {
            tracing::debug!("discard all declined");
            return;
        }
        self.proxy("Failed to discard changes", self.deps().repository.discard_all())
            .await;
    }

    pub async fn stage_file(&self, path: PathBuf) {
        let paths = [path];
        self.proxy("Failed to stage file", self.deps().repository.stage(&paths))
            .await;
    }

    pub async fn unstage_file(&self, path: PathBuf) {
        let paths = [path];
        self.proxy("Failed to unstage file", self.deps().repository.unstage(&paths))
            .await;
    }

    pub async fn discard_file(&self, path: PathBuf) {
        let prompt = format!("Discard changes in {}?", path.display());
        if !self.deps().host.confirm(&prompt, DISCARD_ACTION).await {
            tracing::debug!(path = %path.display(), "discard declined");
            return;
        }
        let paths = [path];
        self.proxy("Failed to discard file", self.deps().repository.discard(&paths))
            .await;
    }

    pub async fn commit(&self, message: &str) {
        if message.trim().is_empty() {
            let reason = GitError::EmptyCommitMessage.to_string();
            return self.report_host_failure("Failed to commit", reason).await;
        }

        if let Err(e) = self.deps().repository.commit(message).await {
            return self.report_host_failure("Failed to commit", e.to_string()).await;
        }

        tracing::info!("commit created");
        self.update_state(|s| s.generated_message = None).await;
        self.publish(Event::CommitSuccess);
        self.deps().host.show_info("Commit created successfully!").await;
        self.refresh_changes().await;
    }

    /// Write `message` into the host's commit input buffer.
    pub async fn insert_to_git(&self, message: &str) {
        if let Err(e) = self.deps().repository.set_commit_input(message).await {
            self.report_host_failure("Failed to insert commit message", e.to_string())
                .await;
        }
    }

    /// Await a host call, then refresh on success or report on failure.
    async fn proxy(&self, title: &str, call: impl Future<Output = Result<(), GitError>>) {
        match call.await {
            Ok(()) => self.refresh_changes().await,
            Err(e) => self.report_host_failure(title, e.to_string()).await,
        }
    }
}

fn changes_or_empty(
    result: Result<(Vec<FileChange>, Vec<FileChange>), GitError>,
) -> (Vec<FileChange>, Vec<FileChange>) {
    match result {
        Ok(lists) => lists,
        Err(GitError::NoRepository) => Default::default(),
        Err(e) => {
            tracing::warn!("could not read repository changes: {e}");
            Default::default()
        }
    }
}
