//! cleancommit: draft Conventional Commits messages from the staged diff.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cleancommit::config::{Config, LayeredSettings, SettingsSource};
use cleancommit::env::Env;
use cleancommit::git::{GitCli, SourceControl};
use cleancommit::host::HostUi;
use cleancommit::orchestrator::{Collaborators, Orchestrator};
use cleancommit::protocol;
use cleancommit::providers::HttpProviderFactory;
use cleancommit::secrets::KeyringStore;
use cleancommit::serve::{serve, ServeOptions, StdioHost};

use cli::args::{Cli, Command, PathsArgs, ServeArgs};
use cli::terminal::{render, TerminalHost};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

/// Shared wiring for every command.
struct App {
    env: Env,
    repository: Arc<GitCli>,
    settings: LayeredSettings,
    config: Config,
}

impl App {
    fn collaborators(&self, host: Arc<dyn HostUi>) -> Collaborators {
        Collaborators {
            settings: Arc::new(self.settings.clone()),
            secrets: Arc::new(KeyringStore::new(self.env.clone())),
            repository: self.repository.clone(),
            providers: Arc::new(HttpProviderFactory::new(self.config.request_timeout())),
            host,
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging();

    let env = Env::real();
    let repository = Arc::new(GitCli::new(&cli.repo));
    let repo_root = repository.root().await.ok();
    tracing::debug!(?repo_root, "resolved repository");

    let settings = LayeredSettings::new(repo_root, env.clone());
    let config = settings.settings().context("failed to load configuration")?;
    let app = App {
        env,
        repository,
        settings,
        config,
    };

    match cli.command {
        Command::Serve(args) => run_serve(&app, args).await,
        command => run_interactive(&app, command).await,
    }
}

/// Run one command against a terminal host and render its events.
async fn run_interactive(app: &App, command: Command) -> Result<()> {
    let assume_yes = matches!(&command, Command::Discard(args) if args.yes);
    let host = Arc::new(TerminalHost::new(assume_yes, app.settings.files()));
    let (orchestrator, mut events) = Orchestrator::new(app.collaborators(host.clone()));

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let renderer = tokio::spawn(async move {
        let mut failed = false;
        while let Some(event) = events.recv().await {
            failed |= render(&event, &cwd);
        }
        failed
    });

    match command {
        Command::Generate(args) => {
            orchestrator.handle(protocol::Command::GenerateCommit).await;
            if args.insert {
                if let Some(message) = orchestrator.state().await.generated_message {
                    orchestrator
                        .handle(protocol::Command::InsertToGit { message })
                        .await;
                    host.show_info("Inserted into the commit input").await;
                }
            }
        }
        Command::Status => orchestrator.handle(protocol::Command::WebviewReady).await,
        Command::Stage(args) => {
            for cmd in path_commands(args, protocol::Command::StageAll, |path| {
                protocol::Command::StageFile { path }
            })? {
                orchestrator.handle(cmd).await;
            }
        }
        Command::Unstage(args) => {
            for cmd in path_commands(args, protocol::Command::UnstageAll, |path| {
                protocol::Command::UnstageFile { path }
            })? {
                orchestrator.handle(cmd).await;
            }
        }
        Command::Discard(args) => {
            for cmd in path_commands(args.target, protocol::Command::DiscardAll, |path| {
                protocol::Command::DiscardFile { path }
            })? {
                orchestrator.handle(cmd).await;
            }
        }
        Command::Commit(args) => {
            let message = match args.message {
                Some(message) => message,
                None => app.repository.commit_input().await?,
            };
            orchestrator.handle(protocol::Command::Commit { message }).await;
        }
        Command::Copy(args) => {
            let text = match args.text {
                Some(text) => text,
                None => app.repository.commit_input().await?,
            };
            orchestrator
                .handle(protocol::Command::CopyToClipboard { text })
                .await;
        }
        Command::SetKey => orchestrator.handle(protocol::Command::SetApiKey).await,
        Command::Settings => {
            orchestrator.handle(protocol::Command::OpenSettings).await;
            let effective = toml::to_string_pretty(&app.config).context("failed to render settings")?;
            println!("\n{effective}");
        }
        Command::Serve(_) => {}
    }

    drop(orchestrator);
    let failed = renderer.await.context("event renderer failed")?;
    if failed {
        process::exit(1);
    }
    Ok(())
}

/// Expand `--all` or explicit paths into protocol commands.
fn path_commands(
    args: PathsArgs,
    all: protocol::Command,
    single: impl Fn(PathBuf) -> protocol::Command,
) -> Result<Vec<protocol::Command>> {
    if args.all {
        return Ok(vec![all]);
    }
    args.paths
        .iter()
        .map(|p| {
            std::path::absolute(p)
                .map(&single)
                .with_context(|| format!("invalid path {}", p.display()))
        })
        .collect()
}

async fn run_serve(app: &App, args: ServeArgs) -> Result<()> {
    let host = Arc::new(StdioHost::new(args.assume_yes, app.settings.files()));
    let (orchestrator, events) = Orchestrator::new(app.collaborators(host));
    let options = ServeOptions {
        poll_interval: Duration::from_millis(args.poll_ms.max(100)),
        repository: app.repository.clone(),
        config_files: app.settings.files(),
    };

    tracing::info!("serving JSON-lines protocol on stdio");
    serve(orchestrator, events, tokio::io::stdin(), tokio::io::stdout(), options)
        .await
        .context("protocol bridge failed")
}
