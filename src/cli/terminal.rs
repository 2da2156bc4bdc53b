//! Terminal host and event rendering.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Confirm, Password};

use cleancommit::host::{osc52_sequence, HostError, HostUi};
use cleancommit::models::{ChangeStatus, FileChange};
use cleancommit::protocol::Event;

/// Interactive host backed by the controlling terminal.
pub struct TerminalHost {
    assume_yes: bool,
    settings_files: Vec<PathBuf>,
}

impl TerminalHost {
    pub fn new(assume_yes: bool, settings_files: Vec<PathBuf>) -> Self {
        Self {
            assume_yes,
            settings_files,
        }
    }
}

#[async_trait]
impl HostUi for TerminalHost {
    async fn confirm(&self, prompt: &str, action: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let prompt = format!("{prompt} ({action})");
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(prompt).default(false).interact()
        })
        .await;
        matches!(answer, Ok(Ok(true)))
    }

    async fn prompt_secret(&self, prompt: &str, placeholder: &str) -> Result<Option<String>, HostError> {
        let prompt = format!("{prompt} ({placeholder})");
        let secret = tokio::task::spawn_blocking(move || {
            Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()
        })
        .await
        .map_err(|e| HostError::Prompt(e.to_string()))?
        .map_err(|e| HostError::Prompt(e.to_string()))?;

        Ok(Some(secret).filter(|s| !s.trim().is_empty()))
    }

    async fn show_info(&self, message: &str) {
        eprintln!("{}", message.green());
    }

    async fn show_error(&self, message: &str) {
        eprintln!("{} {message}", "error:".red().bold());
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        let mut stdout = std::io::stdout();
        if !stdout.is_terminal() {
            return Err(HostError::Clipboard("stdout is not a terminal".to_string()));
        }
        stdout.write_all(osc52_sequence(text).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    async fn open_settings(&self) -> Result<(), HostError> {
        println!("{}", "Settings files (lowest priority first):".bold());
        for path in &self.settings_files {
            let marker = if path.exists() { "✓".green() } else { "·".dimmed() };
            println!("  {marker} {}", path.display());
        }
        Ok(())
    }
}

/// Print one event. Returns `true` for error events.
pub fn render(event: &Event, cwd: &Path) -> bool {
    match event {
        Event::SetState { state } => {
            println!(
                "{} {} ({})",
                "provider:".dimmed(),
                state.provider_label.bold(),
                state.current_provider
            );
            let key = if state.has_api_key {
                "set".green()
            } else {
                "not set (run `cleancommit set-key`)".yellow()
            };
            println!("{}  {key}", "API key:".dimmed());
            if let Some(message) = &state.generated_message {
                println!("{}    {message}", "draft:".dimmed());
            }
        }
        Event::CommitGenerated { message } => println!("{message}"),
        Event::Error {
            error,
            code,
            retryable,
            ..
        } => {
            let hint = if *retryable { " (try again)" } else { "" };
            eprintln!("{} {error}{}", format!("error [{code}]:").red().bold(), hint.dimmed());
            return true;
        }
        Event::Loading { is_loading: true } => {
            eprintln!("{}", "Generating commit message...".dimmed());
        }
        Event::Loading { is_loading: false } | Event::CommitSuccess => {}
        Event::ChangesUpdated { changes, staged } => {
            print_changes("Staged changes", staged, cwd);
            print_changes("Changes", changes, cwd);
        }
    }
    false
}

fn print_changes(title: &str, changes: &[FileChange], cwd: &Path) {
    println!("{} {}", format!("{title}:").bold(), changes.len().to_string().dimmed());
    for change in changes {
        let letter = change.status.letter().to_string();
        let letter = match change.status {
            ChangeStatus::Added | ChangeStatus::Untracked => letter.green(),
            ChangeStatus::Deleted => letter.red(),
            ChangeStatus::Renamed => letter.cyan(),
            ChangeStatus::Modified => letter.yellow(),
        };
        let shown = change.path.strip_prefix(cwd).unwrap_or(&change.path);
        println!("  {letter} {}", shown.display());
    }
}
