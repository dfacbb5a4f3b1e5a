//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `-D key=value`: Build parameter
//! - `--disable`, `--prefer-tags`, `--update-pom`, `--git-tag`,
//!   `--git-branch`: shorthands for the matching build parameters

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::options::{
    Params, OPTION_DISABLE, OPTION_GIT_BRANCH, OPTION_GIT_TAG, OPTION_PREFER_TAGS,
    OPTION_UPDATE_POM,
};

/// git-versioning - derive Maven project versions from git
#[derive(Parser, Debug)]
#[command(name = "git-versioning")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if git-versioning was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Build parameter; available as `${key}` and read as an option
    #[arg(
        short = 'D',
        long = "define",
        value_name = "KEY=VALUE",
        value_parser = parse_define,
        global = true
    )]
    pub defines: Vec<(String, String)>,

    /// Disable versioning (versioning.disable=true)
    #[arg(long, global = true)]
    pub disable: bool,

    /// Consider tags even when a branch is checked out (versioning.preferTags=true)
    #[arg(long, global = true)]
    pub prefer_tags: bool,

    /// Replace the original descriptors (versioning.updatePom=true)
    #[arg(long, global = true)]
    pub update_pom: bool,

    /// Pretend HEAD carries only this tag and no branch (git.tag)
    #[arg(long, value_name = "TAG", global = true)]
    pub git_tag: Option<String>,

    /// Pretend this branch is checked out (git.branch)
    #[arg(long, value_name = "BRANCH", global = true)]
    pub git_branch: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Build parameters; flags override `-D` values of the same option.
    pub fn params(&self) -> Params {
        let mut params: Params = self.defines.iter().cloned().collect();

        let flags = [
            (OPTION_DISABLE, self.disable),
            (OPTION_PREFER_TAGS, self.prefer_tags),
            (OPTION_UPDATE_POM, self.update_pom),
        ];
        for (name, set) in flags {
            if set {
                params.insert(name.to_string(), "true".to_string());
            }
        }
        if let Some(tag) = &self.git_tag {
            params.insert(OPTION_GIT_TAG.to_string(), tag.clone());
        }
        if let Some(branch) = &self.git_branch {
            params.insert(OPTION_GIT_BRANCH.to_string(), branch.clone());
        }

        params
    }
}

/// `key=value`, or a bare `key` meaning `key=true`.
fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').unwrap_or((raw, "true"));
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid build parameter '{}': empty key", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Version the project and all of its modules
    #[command(
        name = "apply",
        long_about = "Version the project and all of its modules.\n\n\
            Resolves the version from the current git situation and the rules in \
            .mvn/git-versioning.toml, then writes a .git-versioned-pom.xml next to \
            each project descriptor. The original descriptors are left untouched \
            unless update_pom is in effect.",
        after_help = "\
EXAMPLES:
    # Version the project in the current directory
    git-versioning apply

    # Pretend a release tag is checked out
    git-versioning apply --git-tag v1.2.0

    # Pass a build parameter usable as ${buildNumber}
    git-versioning apply -D buildNumber=42"
    )]
    Apply {
        /// Root project descriptor (default: pom.xml in the working directory)
        #[arg(short, long, value_name = "POM")]
        file: Option<PathBuf>,
    },

    /// Show the git situation and the resolved version
    #[command(name = "show")]
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Project descriptor used to render the version
        #[arg(short, long, value_name = "POM")]
        file: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    git-versioning completion bash >> ~/.bashrc

    # Zsh
    git-versioning completion zsh > ~/.zfunc/_git-versioning

    # Fish
    git-versioning completion fish > ~/.config/fish/completions/git-versioning.fish

    # PowerShell
    git-versioning completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
