//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine
//! 3. Formats and displays output
//!
//! Handlers map engine errors into `anyhow` with context; `main` turns them
//! into a non-zero exit code.

mod apply;
mod completion;
mod show;

pub use apply::apply;
pub use completion::completion;
pub use show::show;

use std::path::{Path, PathBuf};

use crate::cli::args::Command;
use crate::engine::Context;
use crate::pom::POM_FILE_NAME;
use crate::ui::output::Verbosity;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context, verbosity: Verbosity) -> Result<()> {
    match command {
        Command::Apply { file } => apply(ctx, file.as_deref(), verbosity),
        Command::Show { json, file } => show(ctx, json, file.as_deref()),
        Command::Completion { shell } => completion(shell),
    }
}

/// Descriptor given on the command line, or `pom.xml` in the working directory.
fn root_pom(ctx: &Context, file: Option<&Path>) -> PathBuf {
    match file {
        Some(file) => ctx.cwd.join(file),
        None => ctx.cwd.join(POM_FILE_NAME),
    }
}
