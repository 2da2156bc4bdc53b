//! In-memory collaborators for driving the orchestrator in tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use cleancommit::config::Config;
use cleancommit::error::CommitError;
use cleancommit::git::{GitError, SourceControl};
use cleancommit::host::{HostError, HostUi};
use cleancommit::models::{ChangeStatus, FileChange, GenerateOptions, ProviderType};
use cleancommit::orchestrator::{Collaborators, Orchestrator};
use cleancommit::protocol::Event;
use cleancommit::providers::{CommitProvider, ProviderFactory};
use cleancommit::secrets::{SecretError, SecretStore};

// ---------------------------------------------------------------------------
// repository
// ---------------------------------------------------------------------------

/// A repository that records every mutating call.
#[derive(Default)]
pub struct FakeRepo {
    pub diff: Mutex<String>,
    pub changes: Mutex<Vec<FileChange>>,
    pub staged: Mutex<Vec<FileChange>>,
    pub commit_input: Mutex<String>,
    pub calls: Mutex<Vec<String>>,
    /// When set, every mutating call fails with this stderr.
    pub fail_with: Mutex<Option<String>>,
    pub no_repository: bool,
    /// Reads of a single change list.
    pub list_reads: AtomicUsize,
    /// Reads of both lists at once.
    pub snapshot_reads: AtomicUsize,
}

impl FakeRepo {
    pub fn with_diff(diff: &str) -> Self {
        let repo = Self::default();
        *repo.diff.lock().unwrap() = diff.to_string();
        *repo.staged.lock().unwrap() = vec![FileChange::new("/repo/src/lib.rs", ChangeStatus::Modified)];
        repo
    }

    pub fn outside_repository() -> Self {
        Self {
            no_repository: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), GitError> {
        if self.no_repository {
            return Err(GitError::NoRepository);
        }
        if let Some(stderr) = self.fail_with.lock().unwrap().clone() {
            return Err(GitError::Command {
                command: call,
                stderr,
            });
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn join(paths: &[PathBuf]) -> String {
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl SourceControl for FakeRepo {
    async fn working_tree_changes(&self) -> Result<Vec<FileChange>, GitError> {
        self.list_reads.fetch_add(1, Ordering::SeqCst);
        if self.no_repository {
            return Err(GitError::NoRepository);
        }
        Ok(self.changes.lock().unwrap().clone())
    }

    async fn index_changes(&self) -> Result<Vec<FileChange>, GitError> {
        self.list_reads.fetch_add(1, Ordering::SeqCst);
        if self.no_repository {
            return Err(GitError::NoRepository);
        }
        Ok(self.staged.lock().unwrap().clone())
    }

    async fn changes(&self) -> Result<(Vec<FileChange>, Vec<FileChange>), GitError> {
        self.snapshot_reads.fetch_add(1, Ordering::SeqCst);
        if self.no_repository {
            return Err(GitError::NoRepository);
        }
        let changes = self.changes.lock().unwrap().clone();
        let staged = self.staged.lock().unwrap().clone();
        Ok((changes, staged))
    }

    async fn diff(&self, staged: bool) -> Result<String, GitError> {
        if self.no_repository {
            return Err(GitError::NoRepository);
        }
        Ok(if staged {
            self.diff.lock().unwrap().clone()
        } else {
            String::new()
        })
    }

    async fn stage(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        self.record(format!("stage {}", Self::join(paths)))
    }

    async fn unstage(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        self.record(format!("unstage {}", Self::join(paths)))
    }

    async fn discard(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        self.record(format!("discard {}", Self::join(paths)))
    }

    async fn commit(&self, message: &str) -> Result<(), GitError> {
        self.record(format!("commit {message}"))?;
        self.staged.lock().unwrap().clear();
        self.diff.lock().unwrap().clear();
        Ok(())
    }

    async fn set_commit_input(&self, message: &str) -> Result<(), GitError> {
        self.record(format!("input {message}"))?;
        *self.commit_input.lock().unwrap() = message.to_string();
        Ok(())
    }

    async fn commit_input(&self) -> Result<String, GitError> {
        Ok(self.commit_input.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// secrets
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySecrets {
    pub keys: Mutex<HashMap<ProviderType, String>>,
}

impl MemorySecrets {
    pub fn with_key(provider: ProviderType, key: &str) -> Self {
        let secrets = Self::default();
        secrets.keys.lock().unwrap().insert(provider, key.to_string());
        secrets
    }
}

#[async_trait]
impl SecretStore for MemorySecrets {
    async fn get(&self, provider: ProviderType) -> Result<Option<String>, SecretError> {
        Ok(self.keys.lock().unwrap().get(&provider).cloned())
    }

    async fn store(&self, provider: ProviderType, secret: &str) -> Result<(), SecretError> {
        self.keys.lock().unwrap().insert(provider, secret.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// host
// ---------------------------------------------------------------------------

/// A host with scripted answers that records what it was asked to show.
#[derive(Default)]
pub struct FakeHost {
    pub confirm_answer: bool,
    pub secret_answer: Option<String>,
    pub prompts: Mutex<Vec<String>>,
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub clipboard: Mutex<Option<String>>,
}

impl FakeHost {
    pub fn confirming(answer: bool) -> Self {
        Self {
            confirm_answer: answer,
            ..Self::default()
        }
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostUi for FakeHost {
    async fn confirm(&self, prompt: &str, _action: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.confirm_answer
    }

    async fn prompt_secret(&self, prompt: &str, _placeholder: &str) -> Result<Option<String>, HostError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.secret_answer.clone())
    }

    async fn show_info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    async fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        *self.clipboard.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    async fn open_settings(&self) -> Result<(), HostError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// providers
// ---------------------------------------------------------------------------

/// What the fake provider does when called.
#[derive(Clone)]
pub enum Reply {
    Message(String),
    Fail(CommitError),
    Panic,
}

/// Factory handing out providers that share one call log.
#[derive(Clone)]
pub struct FakeFactory {
    pub reply: Reply,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub diffs: Arc<Mutex<Vec<String>>>,
}

impl FakeFactory {
    pub fn replying(reply: Reply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            diffs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProviderFactory for FakeFactory {
    fn create(
        &self,
        provider: ProviderType,
        _api_key: &str,
    ) -> Result<Box<dyn CommitProvider>, CommitError> {
        Ok(Box::new(FakeProvider {
            provider,
            factory: self.clone(),
        }))
    }
}

struct FakeProvider {
    provider: ProviderType,
    factory: FakeFactory,
}

#[async_trait]
impl CommitProvider for FakeProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn generate_commit_message(
        &self,
        diff: &str,
        _options: &GenerateOptions,
    ) -> Result<String, CommitError> {
        self.factory.calls.fetch_add(1, Ordering::SeqCst);
        self.factory.diffs.lock().unwrap().push(diff.to_string());
        if !self.factory.delay.is_zero() {
            tokio::time::sleep(self.factory.delay).await;
        }
        match &self.factory.reply {
            Reply::Message(message) => Ok(message.clone()),
            Reply::Fail(err) => Err(err.clone()),
            Reply::Panic => panic!("provider exploded"),
        }
    }
}

// ---------------------------------------------------------------------------
// harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub events: UnboundedReceiver<Event>,
    pub repo: Arc<FakeRepo>,
    pub secrets: Arc<MemorySecrets>,
    pub host: Arc<FakeHost>,
    pub factory: FakeFactory,
}

impl Harness {
    pub fn new(config: Config, repo: FakeRepo, secrets: MemorySecrets, host: FakeHost, factory: FakeFactory) -> Self {
        let repo = Arc::new(repo);
        let secrets = Arc::new(secrets);
        let host = Arc::new(host);
        let (orchestrator, events) = Orchestrator::new(Collaborators {
            settings: Arc::new(config),
            secrets: secrets.clone(),
            repository: repo.clone(),
            providers: Arc::new(factory.clone()),
            host: host.clone(),
        });
        Self {
            orchestrator,
            events,
            repo,
            secrets,
            host,
            factory,
        }
    }

    /// Gemini key present, one staged file, provider answering `message`.
    pub fn ready(diff: &str, reply: Reply) -> Self {
        Self::new(
            Config::default(),
            FakeRepo::with_diff(diff),
            MemorySecrets::with_key(ProviderType::Gemini, "test-key"),
            FakeHost::confirming(true),
            FakeFactory::replying(reply),
        )
    }

    /// Every event published so far.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// The `isLoading` values of every `loading` event, in order.
pub fn loading_flags(events: &[Event]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Loading { is_loading } => Some(*is_loading),
            _ => None,
        })
        .collect()
}

/// Every error event, in order.
pub fn errors(events: &[Event]) -> Vec<&Event> {
    events.iter().filter(|e| matches!(e, Event::Error { .. })).collect()
}
