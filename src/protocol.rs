//! Messages exchanged with the presentation surface.
//!
//! Inbound commands are tagged by `command`, outbound events by `type`;
//! both use camelCase names and fields.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CommitError, ErrorCode};
use crate::models::{FileChange, ProviderType, SessionState};

/// User intent forwarded by the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    WebviewReady,
    GenerateCommit,
    InsertToGit { message: String },
    SetApiKey,
    CopyToClipboard { text: String },
    OpenSettings,
    StageAll,
    UnstageAll,
    DiscardAll,
    StageFile { path: PathBuf },
    UnstageFile { path: PathBuf },
    DiscardFile { path: PathBuf },
    Commit { message: String },
    RefreshChanges,
}

/// State changes published by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    SetState {
        state: SessionState,
    },
    CommitGenerated {
        message: String,
    },
    Error {
        error: String,
        code: ErrorCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderType>,
        #[serde(default)]
        retryable: bool,
    },
    Loading {
        is_loading: bool,
    },
    ChangesUpdated {
        changes: Vec<FileChange>,
        staged: Vec<FileChange>,
    },
    CommitSuccess,
}

impl From<CommitError> for Event {
    fn from(err: CommitError) -> Self {
        Event::Error {
            error: err.message,
            code: err.code,
            provider: err.provider,
            retryable: err.retryable,
        }
    }
}
