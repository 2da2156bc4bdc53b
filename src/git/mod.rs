//! Source-control collaborator.
//!
//! The orchestrator only talks to [`SourceControl`]; [`GitCli`] is the
//! production implementation that shells out to `git`.

pub mod cli;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use cli::GitCli;

use crate::models::FileChange;

/// Errors from source-control operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("No repository found")]
    NoRepository,

    #[error("Commit message cannot be empty")]
    EmptyCommitMessage,

    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("git output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to access commit input {path}: {source}")]
    CommitInput {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Repository operations the orchestrator needs.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Unstaged changes, untracked files included.
    async fn working_tree_changes(&self) -> Result<Vec<FileChange>, GitError>;

    /// Staged changes.
    async fn index_changes(&self) -> Result<Vec<FileChange>, GitError>;

    /// Unified diff of the staged (`true`) or unstaged (`false`) scope.
    async fn diff(&self, staged: bool) -> Result<String, GitError>;

    async fn stage(&self, paths: &[PathBuf]) -> Result<(), GitError>;

    async fn unstage(&self, paths: &[PathBuf]) -> Result<(), GitError>;

    /// Throw away working-tree changes; untracked files are deleted.
    async fn discard(&self, paths: &[PathBuf]) -> Result<(), GitError>;

    async fn commit(&self, message: &str) -> Result<(), GitError>;

    async fn set_commit_input(&self, message: &str) -> Result<(), GitError>;

    /// Current draft commit message, empty when none.
    async fn commit_input(&self) -> Result<String, GitError>;

    /// Working-tree and index changes from one snapshot of the repository.
    async fn changes(&self) -> Result<(Vec<FileChange>, Vec<FileChange>), GitError> {
        tokio::try_join!(self.working_tree_changes(), self.index_changes())
    }

    async fn staged_diff(&self) -> Result<String, GitError> {
        self.diff(true).await
    }

    async fn stage_all(&self) -> Result<(), GitError> {
        let paths = paths_of(self.working_tree_changes().await?);
        if paths.is_empty() {
            return Ok(());
        }
        self.stage(&paths).await
    }

    async fn unstage_all(&self) -> Result<(), GitError> {
        let paths = paths_of(self.index_changes().await?);
        if paths.is_empty() {
            return Ok(());
        }
        self.unstage(&paths).await
    }

    async fn discard_all(&self) -> Result<(), GitError> {
        let paths = paths_of(self.working_tree_changes().await?);
        if paths.is_empty() {
            return Ok(());
        }
        self.discard(&paths).await
    }
}

fn paths_of(changes: Vec<FileChange>) -> Vec<PathBuf> {
    changes.into_iter().map(|c| c.path).collect()
}
