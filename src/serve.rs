//! JSON-lines bridge for editor front-ends.
//!
//! One [`Command`] per input line, one [`Event`] per output line. The
//! repository and config files are polled so external changes reach the
//! front-end without a command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

use crate::git::SourceControl;
use crate::host::{osc52_sequence, HostError, HostUi};
use crate::models::FileChange;
use crate::orchestrator::Orchestrator;
use crate::protocol::{Command, Event};

/// Default interval between repository polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Host used when stdin/stdout carry the protocol.
///
/// There is no terminal to ask, so confirmations follow a fixed policy
/// and notifications go to the log.
#[derive(Debug, Clone)]
pub struct StdioHost {
    assume_yes: bool,
    settings_files: Vec<PathBuf>,
}

impl StdioHost {
    pub fn new(assume_yes: bool, settings_files: Vec<PathBuf>) -> Self {
        Self {
            assume_yes,
            settings_files,
        }
    }
}

#[async_trait]
impl HostUi for StdioHost {
    async fn confirm(&self, prompt: &str, action: &str) -> bool {
        tracing::info!(action, answer = self.assume_yes, "{prompt}");
        self.assume_yes
    }

    async fn prompt_secret(&self, _prompt: &str, _placeholder: &str) -> Result<Option<String>, HostError> {
        Err(HostError::Prompt(
            "no terminal available in serve mode; run `cleancommit set-key`".to_string(),
        ))
    }

    async fn show_info(&self, message: &str) {
        tracing::info!("{message}");
    }

    async fn show_error(&self, message: &str) {
        tracing::error!("{message}");
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        let mut stderr = tokio::io::stderr();
        stderr.write_all(osc52_sequence(text).as_bytes()).await?;
        stderr.flush().await?;
        Ok(())
    }

    async fn open_settings(&self) -> Result<(), HostError> {
        for path in &self.settings_files {
            tracing::info!(path = %path.display(), "settings file");
        }
        Ok(())
    }
}

/// Detects changes in the repository's change lists between polls.
pub struct RepositoryWatcher {
    repository: Arc<dyn SourceControl>,
    last: Option<(Vec<FileChange>, Vec<FileChange>)>,
}

impl RepositoryWatcher {
    pub fn new(repository: Arc<dyn SourceControl>) -> Self {
        Self {
            repository,
            last: None,
        }
    }

    /// `true` when the lists differ from the previous poll. The first
    /// poll only records a baseline.
    pub async fn poll(&mut self) -> bool {
        let current = self.repository.changes().await.unwrap_or_default();
        let changed = self.last.as_ref().is_some_and(|last| *last != current);
        self.last = Some(current);
        changed
    }
}

/// Detects modification of config files between polls.
pub struct FileWatcher {
    paths: Vec<PathBuf>,
    last: Vec<Option<SystemTime>>,
}

impl FileWatcher {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        let last = paths.iter().map(|p| modified(p)).collect();
        Self { paths, last }
    }

    /// `true` when any file was created, removed or modified.
    pub fn poll(&mut self) -> bool {
        let current: Vec<_> = self.paths.iter().map(|p| modified(p)).collect();
        let changed = current != self.last;
        self.last = current;
        changed
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Knobs for [`serve`].
pub struct ServeOptions {
    pub poll_interval: Duration,
    pub repository: Arc<dyn SourceControl>,
    pub config_files: Vec<PathBuf>,
}

/// Run the bridge until `input` reaches end of file.
///
/// Generation runs on its own task so refreshes and other commands keep
/// flowing while a request is in flight. `orchestrator` must be the last
/// handle to its session, otherwise the output never drains.
pub async fn serve<R, W>(
    orchestrator: Orchestrator,
    events: UnboundedReceiver<Event>,
    input: R,
    output: W,
    options: ServeOptions,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = tokio::spawn(write_events(events, output));

    let mut lines = BufReader::new(input).lines();
    let mut tasks = JoinSet::new();
    let mut ticker = tokio::time::interval(options.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut repository_watcher = RepositoryWatcher::new(options.repository);
    let mut config_watcher = FileWatcher::new(options.config_files);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let command = match serde_json::from_str::<Command>(line) {
                    Ok(command) => command,
                    Err(e) => {
                        tracing::warn!("skipping malformed command: {e}");
                        continue;
                    }
                };
                if command == Command::GenerateCommit {
                    let orchestrator = orchestrator.clone();
                    tasks.spawn(async move { orchestrator.handle(command).await });
                } else {
                    orchestrator.handle(command).await;
                }
            }
            _ = ticker.tick() => {
                if repository_watcher.poll().await {
                    orchestrator.on_repository_changed().await;
                }
                if config_watcher.poll() {
                    orchestrator.on_configuration_changed().await;
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!("generation task failed: {e}");
                }
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!("generation task failed: {e}");
        }
    }
    drop(orchestrator);

    writer
        .await
        .map_err(|e| std::io::Error::other(format!("event writer failed: {e}")))?
}

async fn write_events<W>(mut events: UnboundedReceiver<Event>, mut output: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let mut line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("failed to encode event: {e}");
                continue;
            }
        };
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}
