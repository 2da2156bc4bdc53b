//! Clap argument types.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use cleancommit::serve::DEFAULT_POLL_INTERVAL;

/// Draft Conventional Commits messages from your staged changes.
#[derive(Parser, Debug)]
#[command(name = "cleancommit", version)]
pub struct Cli {
    /// Path inside the repository to operate on (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a commit message from the staged diff.
    Generate(GenerateArgs),

    /// Show provider, credential and change status.
    Status,

    /// Stage files (or every working-tree change with --all).
    Stage(PathsArgs),

    /// Unstage files (or every staged change with --all).
    Unstage(PathsArgs),

    /// Discard working-tree changes. Untracked files are deleted.
    Discard(DiscardArgs),

    /// Commit the staged changes.
    Commit(CommitArgs),

    /// Copy text (default: the drafted commit message) to the clipboard.
    Copy(CopyArgs),

    /// Store the API key for the configured provider in the OS keyring.
    SetKey,

    /// Show effective settings and where they come from.
    Settings,

    /// Speak the JSON-lines protocol on stdin/stdout for editor front-ends.
    Serve(ServeArgs),
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Write the generated message into the commit input buffer.
    #[arg(long, default_value_t = false)]
    pub insert: bool,
}

/// Paths for `stage` / `unstage`.
#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Files to operate on.
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub paths: Vec<PathBuf>,

    /// Operate on every change in scope.
    #[arg(long, default_value_t = false)]
    pub all: bool,
}

/// Arguments for the `discard` subcommand.
#[derive(Args, Debug)]
pub struct DiscardArgs {
    #[command(flatten)]
    pub target: PathsArgs,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,
}

/// Arguments for the `commit` subcommand.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Commit message (default: the commit input buffer).
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

/// Arguments for the `copy` subcommand.
#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Text to copy.
    pub text: Option<String>,
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Answer yes to destructive confirmations (discard).
    #[arg(long, default_value_t = false)]
    pub assume_yes: bool,

    /// Milliseconds between repository polls.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    pub poll_ms: u64,
}
