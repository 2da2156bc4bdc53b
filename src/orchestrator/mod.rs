//! Orchestrator: owns the session state, runs generation, and proxies
//! repository operations.
//!
//! Observers never share the state; they receive [`Event`]s through the
//! channel returned by [`Orchestrator::new`].

mod generate;
mod repository;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::config::{Config, SettingsSource};
use crate::error::ErrorCode;
use crate::git::SourceControl;
use crate::host::HostUi;
use crate::models::SessionState;
use crate::protocol::{Command, Event};
use crate::providers::ProviderFactory;
use crate::secrets::SecretStore;

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub settings: Arc<dyn SettingsSource>,
    pub secrets: Arc<dyn SecretStore>,
    pub repository: Arc<dyn SourceControl>,
    pub providers: Arc<dyn ProviderFactory>,
    pub host: Arc<dyn HostUi>,
}

/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    deps: Collaborators,
    events: mpsc::UnboundedSender<Event>,
    state: Mutex<SessionState>,
    /// In-flight guard: at most one generation at a time.
    generating: AtomicBool,
}

impl Orchestrator {
    pub fn new(deps: Collaborators) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            inner: Arc::new(Inner {
                deps,
                events,
                state: Mutex::new(SessionState::default()),
                generating: AtomicBool::new(false),
            }),
        };
        (orchestrator, rx)
    }

    /// Dispatch one inbound command.
    pub async fn handle(&self, command: Command) {
        tracing::debug!(?command, "handling command");
        match command {
            Command::WebviewReady => {
                self.send_state(true).await;
                self.refresh_changes().await;
            }
            Command::GenerateCommit => self.generate().await,
            Command::InsertToGit { message } => self.insert_to_git(&message).await,
            Command::SetApiKey => self.set_api_key().await,
            Command::CopyToClipboard { text } => self.copy_to_clipboard(&text).await,
            Command::OpenSettings => self.open_settings().await,
            Command::StageAll => self.stage_all().await,
            Command::UnstageAll => self.unstage_all().await,
            Command::DiscardAll => self.discard_all().await,
            Command::StageFile { path } => self.stage_file(path).await,
            Command::UnstageFile { path } => self.unstage_file(path).await,
            Command::DiscardFile { path } => self.discard_file(path).await,
            Command::Commit { message } => self.commit(&message).await,
            Command::RefreshChanges => self.refresh_changes().await,
        }
    }

    /// The host repository changed on disk.
    pub async fn on_repository_changed(&self) {
        self.refresh_changes().await;
    }

    /// Settings changed; the provider (and thus the credential) may differ.
    pub async fn on_configuration_changed(&self) {
        self.send_state(false).await;
    }

    /// Snapshot of the authoritative state.
    pub async fn state(&self) -> SessionState {
        self.inner.state.lock().await.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.inner.generating.load(Ordering::SeqCst)
    }

    fn deps(&self) -> &Collaborators {
        &self.inner.deps
    }

    fn publish(&self, event: Event) {
        if self.inner.events.send(event).is_err() {
            tracing::debug!("event receiver dropped; discarding event");
        }
    }

    async fn update_state(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.inner.state.lock().await;
        f(&mut state);
    }

    fn load_settings(&self) -> Config {
        self.deps().settings.settings().unwrap_or_else(|e| {
            tracing::warn!("falling back to default settings: {e}");
            Config::default()
        })
    }

    /// Recompute the provider and repository fields and publish the state.
    ///
    /// `reset` starts a fresh session, dropping any previous message and
    /// error.
    async fn send_state(&self, reset: bool) {
        let provider = self.load_settings().provider.name;

        let has_api_key = match self.deps().secrets.get(provider).await {
            Ok(key) => key.is_some_and(|k| !k.trim().is_empty()),
            Err(e) => {
                tracing::warn!(%provider, "could not read stored API key: {e}");
                false
            }
        };
        let has_staged_changes = match self.deps().repository.staged_diff().await {
            Ok(diff) => !diff.trim().is_empty(),
            Err(e) => {
                tracing::debug!("no staged diff available: {e}");
                false
            }
        };

        let snapshot = {
            let mut state = self.inner.state.lock().await;
            if reset {
                state.generated_message = None;
                state.error = None;
            }
            state.has_api_key = has_api_key;
            state.has_staged_changes = has_staged_changes;
            state.is_loading = self.is_generating();
            state.current_provider = provider;
            state.provider_label = provider.label().to_string();
            state.clone()
        };
        self.publish(Event::SetState { state: snapshot });
    }

    /// Surface a failed host call: a notification plus an `UNKNOWN` error event.
    async fn report_host_failure(&self, title: &str, message: String) {
        tracing::warn!("{title}: {message}");
        self.deps()
            .host
            .show_error(&format!("{title}: {message}"))
            .await;
        self.update_state(|s| s.error = Some(message.clone())).await;
        self.publish(Event::Error {
            error: message,
            code: ErrorCode::Unknown,
            provider: None,
            retryable: false,
        });
    }

    async fn set_api_key(&self) {
        let provider = self.load_settings().provider.name;
        let descriptor = provider.descriptor();
        let prompt = format!("Enter your {} API Key", descriptor.label);

        let secret = match self.deps().host.prompt_secret(&prompt, descriptor.placeholder).await {
            Ok(Some(secret)) if !secret.trim().is_empty() => secret,
            Ok(_) => {
                tracing::debug!("API key entry cancelled");
                return;
            }
            Err(e) => return self.report_host_failure("Failed to read API key", e.to_string()).await,
        };

        if let Err(e) = self.deps().secrets.store(provider, secret.trim()).await {
            return self.report_host_failure("Failed to save API key", e.to_string()).await;
        }
        self.deps()
            .host
            .show_info(&format!("{} API key saved successfully!", descriptor.label))
            .await;
        self.send_state(false).await;
    }

    async fn copy_to_clipboard(&self, text: &str) {
        match self.deps().host.write_clipboard(text).await {
            Ok(()) => self.deps().host.show_info("Copied to clipboard!").await,
            Err(e) => self.report_host_failure("Failed to copy to clipboard", e.to_string()).await,
        }
    }

    async fn open_settings(&self) {
        if let Err(e) = self.deps().host.open_settings().await {
            self.report_host_failure("Failed to open settings", e.to_string()).await;
        }
    }
}
