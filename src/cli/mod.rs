//! cli
//!
//! Command-line interface layer for git-versioning.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds an
//! [`crate::engine::Context`] and dispatches to the engine. The CLI plays
//! the part of the build host: it decides which descriptors get processed.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use crate::ui::output::{init_logging, Verbosity};
use anyhow::{Context as _, Result};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    init_logging(verbosity);

    let cwd = match &cli.cwd {
        Some(cwd) => cwd
            .canonicalize()
            .with_context(|| format!("failed to resolve '{}'", cwd.display()))?,
        None => std::env::current_dir().context("failed to determine working directory")?,
    };
    let ctx = engine::Context::from_process(&cwd, cli.params());

    commands::dispatch(cli.command, &ctx, verbosity)
}
