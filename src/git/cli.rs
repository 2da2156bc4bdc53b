//! Git CLI implementation of [`SourceControl`].
//!
//! Shells out to `git` via `tokio::process::Command`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{GitError, SourceControl};
use crate::constants::COMMIT_INPUT_FILENAME;
use crate::models::{ChangeStatus, FileChange};

/// Resolved repository location.
#[derive(Debug, Clone)]
struct Location {
    root: PathBuf,
    git_dir: PathBuf,
}

/// Repository access through the `git` executable.
///
/// The repository is located lazily from `workdir` on first use, so a
/// repository created after startup is picked up.
#[derive(Debug)]
pub struct GitCli {
    workdir: PathBuf,
    location: OnceCell<Location>,
}

/// One `git status` snapshot split into its two scopes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub working_tree: Vec<FileChange>,
    pub index: Vec<FileChange>,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            location: OnceCell::new(),
        }
    }

    /// Root of the working tree, if `workdir` is inside a repository.
    pub async fn root(&self) -> Result<PathBuf, GitError> {
        Ok(self.location().await?.root.clone())
    }

    async fn location(&self) -> Result<&Location, GitError> {
        self.location
            .get_or_try_init(|| async {
                let output = tokio::process::Command::new("git")
                    .args(["rev-parse", "--show-toplevel", "--absolute-git-dir"])
                    .current_dir(&self.workdir)
                    .output()
                    .await
                    .map_err(|e| match e.kind() {
                        // A missing working directory cannot hold a repository.
                        std::io::ErrorKind::NotFound if !self.workdir.exists() => GitError::NoRepository,
                        _ => GitError::Spawn(e),
                    })?;
                if !output.status.success() {
                    return Err(GitError::NoRepository);
                }
                let stdout = String::from_utf8(output.stdout)?;
                let mut lines = stdout.lines();
                match (lines.next(), lines.next()) {
                    (Some(root), Some(git_dir)) => Ok(Location {
                        root: PathBuf::from(root),
                        git_dir: PathBuf::from(git_dir),
                    }),
                    // Bare repositories have no working tree.
                    _ => Err(GitError::NoRepository),
                }
            })
            .await
    }

    async fn run(&self, args: &[&str], paths: &[PathBuf]) -> Result<String, GitError> {
        let location = self.location().await?;
        let output = tokio::process::Command::new("git")
            .args(args)
            .args(paths)
            .current_dir(&location.root)
            .output()
            .await
            .map_err(GitError::Spawn)?;

        if !output.status.success() {
            return Err(GitError::Command {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    /// Read working-tree and index changes in one `git status` call.
    pub async fn status(&self) -> Result<StatusSnapshot, GitError> {
        let root = self.location().await?.root.clone();
        let output = self
            .run(&["status", "--porcelain=v1", "-z", "--untracked-files=all"], &[])
            .await?;
        Ok(parse_porcelain(&root, &output))
    }

    async fn has_head(&self) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", "HEAD"], &[])
            .await
            .is_ok()
    }

    async fn commit_input_path(&self) -> Result<PathBuf, GitError> {
        Ok(self.location().await?.git_dir.join(COMMIT_INPUT_FILENAME))
    }
}

/// Parse `git status --porcelain=v1 -z` output.
///
/// Paths are joined onto `root`. Untracked entries only appear in the
/// working tree; an entry changed in both scopes appears in both.
pub fn parse_porcelain(root: &Path, output: &str) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::default();
    let mut entries = output.split('\0').filter(|e| !e.is_empty());

    while let Some(entry) = entries.next() {
        let mut codes = entry.chars();
        let (Some(x), Some(y)) = (codes.next(), codes.next()) else {
            continue;
        };
        let Some(path) = entry.get(3..).filter(|p| !p.is_empty()) else {
            continue;
        };
        // Renames and copies are followed by their source path.
        if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            entries.next();
        }

        let path = root.join(path);
        match (x, y) {
            ('?', _) => snapshot
                .working_tree
                .push(FileChange::new(path, ChangeStatus::Untracked)),
            ('!', _) => {}
            _ => {
                if x != ' ' {
                    snapshot
                        .index
                        .push(FileChange::new(path.clone(), ChangeStatus::from_porcelain(x)));
                }
                if y != ' ' {
                    snapshot
                        .working_tree
                        .push(FileChange::new(path, ChangeStatus::from_porcelain(y)));
                }
            }
        }
    }

    snapshot
}

#[async_trait]
impl SourceControl for GitCli {
    async fn working_tree_changes(&self) -> Result<Vec<FileChange>, GitError> {
        Ok(self.status().await?.working_tree)
    }

    async fn index_changes(&self) -> Result<Vec<FileChange>, GitError> {
        Ok(self.status().await?.index)
    }

    async fn changes(&self) -> Result<(Vec<FileChange>, Vec<FileChange>), GitError> {
        let snapshot = self.status().await?;
        Ok((snapshot.working_tree, snapshot.index))
    }

    async fn diff(&self, staged: bool) -> Result<String, GitError> {
        let mut args = vec!["diff", "--no-color", "--no-ext-diff"];
        if staged {
            args.push("--cached");
        }
        self.run(&args, &[]).await
    }

    async fn stage(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.run(&["add", "--"], paths).await.map(drop)
    }

    async fn unstage(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        if self.has_head().await {
            self.run(&["reset", "-q", "HEAD", "--"], paths).await.map(drop)
        } else {
            // Nothing to reset to before the first commit.
            self.run(&["rm", "--cached", "-r", "-q", "--"], paths).await.map(drop)
        }
    }

    async fn discard(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let root = self.location().await?.root.clone();
        let untracked: HashSet<PathBuf> = self
            .status()
            .await?
            .working_tree
            .into_iter()
            .filter(|c| c.status == ChangeStatus::Untracked)
            .map(|c| c.path)
            .collect();

        let (untracked_paths, tracked_paths): (Vec<PathBuf>, Vec<PathBuf>) = paths
            .iter()
            .cloned()
            .partition(|p| untracked.contains(&root.join(p)));

        if !tracked_paths.is_empty() {
            self.run(&["checkout", "-q", "--"], &tracked_paths).await?;
        }
        if !untracked_paths.is_empty() {
            self.run(&["clean", "-f", "-q", "--"], &untracked_paths).await?;
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<(), GitError> {
        if message.trim().is_empty() {
            return Err(GitError::EmptyCommitMessage);
        }
        self.run(&["commit", "-q", "-m", message], &[]).await?;

        let path = self.commit_input_path().await?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GitError::CommitInput { path, source }),
        }
    }

    async fn set_commit_input(&self, message: &str) -> Result<(), GitError> {
        let path = self.commit_input_path().await?;
        tokio::fs::write(&path, message)
            .await
            .map_err(|source| GitError::CommitInput { path, source })
    }

    async fn commit_input(&self) -> Result<String, GitError> {
        let path = self.commit_input_path().await?;
        match tokio::fs::read_to_string(&path).await {
            Ok(message) => Ok(message),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(GitError::CommitInput { path, source }),
        }
    }
}
