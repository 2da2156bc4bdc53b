//! User-facing host capabilities the orchestrator relies on.
//!
//! Confirmation dialogs, hidden input, notifications, the clipboard and
//! the settings surface all live behind [`HostUi`].

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait HostUi: Send + Sync {
    /// Ask the user to confirm a destructive `action`. `false` means declined.
    async fn confirm(&self, prompt: &str, action: &str) -> bool;

    /// Ask for a hidden value. `None` when the user cancels.
    async fn prompt_secret(&self, prompt: &str, placeholder: &str) -> Result<Option<String>, HostError>;

    async fn show_info(&self, message: &str);

    async fn show_error(&self, message: &str);

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError>;

    async fn open_settings(&self) -> Result<(), HostError>;
}

/// OSC 52 escape sequence asking the terminal to put `text` on the
/// system clipboard.
pub fn osc52_sequence(text: &str) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{payload}\x07")
}
