//! Repository change entries as published to the presentation surface.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Five-way status vocabulary for a changed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeStatus {
    #[serde(rename = "M")]
    Modified,
    #[serde(rename = "A")]
    Added,
    #[serde(rename = "D")]
    Deleted,
    #[serde(rename = "R")]
    Renamed,
    #[serde(rename = "U")]
    Untracked,
}

impl ChangeStatus {
    /// Map a `git status --porcelain` status letter.
    ///
    /// Copies, type changes and unmerged entries have no counterpart and
    /// fall back to [`ChangeStatus::Modified`].
    pub fn from_porcelain(code: char) -> Self {
        match code {
            'M' => ChangeStatus::Modified,
            'A' => ChangeStatus::Added,
            'D' => ChangeStatus::Deleted,
            'R' => ChangeStatus::Renamed,
            '?' => ChangeStatus::Untracked,
            _ => ChangeStatus::Modified,
        }
    }

    pub fn letter(self) -> char {
        match self {
            ChangeStatus::Modified => 'M',
            ChangeStatus::Added => 'A',
            ChangeStatus::Deleted => 'D',
            ChangeStatus::Renamed => 'R',
            ChangeStatus::Untracked => 'U',
        }
    }
}

/// One changed path within a single status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: PathBuf,
    /// Display-only; derived from `path`.
    pub file_name: String,
    pub status: ChangeStatus,
}

impl FileChange {
    pub fn new(path: impl Into<PathBuf>, status: ChangeStatus) -> Self {
        let path = path.into();
        let file_name = display_name(&path);
        Self {
            path,
            file_name,
            status,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
