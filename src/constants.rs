//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and request defaults so a rename only requires changing this file.

/// Display name of the tool (lowercase). Also the keyring service name.
pub const APP_NAME: &str = "cleancommit";

/// Product name sent to backends that ask for an application title.
pub const APP_TITLE: &str = "CleanCommit";

/// Project homepage, sent as the referer to OpenRouter.
pub const HOMEPAGE_URL: &str = "https://github.com/brandonpaldom/clean-commit";

/// Local config filename (e.g. `.cleancommit.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".cleancommit.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "cleancommit";

/// File inside the git directory that backs the commit input buffer.
pub const COMMIT_INPUT_FILENAME: &str = "CLEANCOMMIT_EDITMSG";

// ── Request defaults ────────────────────────────────────────────────

/// Sampling temperature sent with every generation request.
pub const TEMPERATURE: f32 = 0.3;

/// Upper bound on completion tokens.
pub const MAX_OUTPUT_TOKENS: u32 = 500;

/// Request timeout applied to every backend call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default bound on the diff sent to a backend, in characters.
pub const DEFAULT_MAX_DIFF_SIZE: usize = 4000;

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "CLEANCOMMIT_PROVIDER";
pub const ENV_LANGUAGE: &str = "CLEANCOMMIT_LANGUAGE";
pub const ENV_MAX_DIFF_SIZE: &str = "CLEANCOMMIT_MAX_DIFF_SIZE";
pub const ENV_INCLUDE_BODY: &str = "CLEANCOMMIT_INCLUDE_BODY";
pub const ENV_TIMEOUT: &str = "CLEANCOMMIT_TIMEOUT";
pub const ENV_LOG: &str = "CLEANCOMMIT_LOG";
