//! CLI command definitions, terminal host and logging setup.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;
pub mod terminal;

use tracing_subscriber::EnvFilter;

use cleancommit::constants::ENV_LOG;

/// Install the stderr log subscriber. `CLEANCOMMIT_LOG` takes an
/// `EnvFilter` directive; the default only shows warnings.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
