//! cleancommit: draft Conventional Commits messages from the staged diff
//! (library crate).
//!
//! Re-exports public modules for integration tests and front-ends.

pub mod config;
pub mod constants;
pub mod env;
pub mod error;
pub mod git;
pub mod host;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod protocol;
pub mod providers;
pub mod secrets;
pub mod serve;
