//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Versioning is configured per execution root. The execution root is the
//! nearest ancestor of the working directory that contains a `.mvn`
//! directory; the configuration lives at `.mvn/git-versioning.toml`.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Configuration file
//! 3. Environment variables (see [`crate::core::options`])
//! 4. Build parameters and CLI flags (see [`crate::core::options`])
//!
//! # Example
//!
//! ```no_run
//! use git_versioning::core::config::Config;
//! use std::path::Path;
//!
//! let loaded = Config::load(Path::new("/path/to/project/module")).unwrap();
//! println!("execution root: {}", loaded.execution_root.display());
//! println!("branch rules: {}", loaded.config.branch.len());
//! ```

pub mod schema;

pub use schema::{Configuration, PropertyRule, RulePattern, VersionRule};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory that marks an execution root.
pub const MVN_DIR: &str = ".mvn";

/// File name of the configuration inside [`MVN_DIR`].
pub const CONFIG_FILE_NAME: &str = "git-versioning.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can not find {MVN_DIR} directory in hierarchy of '{start}'")]
    MvnDirNotFound { start: PathBuf },

    #[error("config file not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The parsed and validated configuration.
    pub config: Configuration,
    /// Where it was read from.
    pub path: PathBuf,
    /// Directory containing the `.mvn` directory.
    pub execution_root: PathBuf,
}

/// Configuration loading entry points.
#[derive(Debug)]
pub struct Config;

impl Config {
    /// Locate the execution root above `start` and load its configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MvnDirNotFound`] if no ancestor has a `.mvn` directory
    /// - [`ConfigError::NotFound`] if the configuration file is missing
    /// - [`ConfigError::ParseError`] / [`ConfigError::InvalidValue`] for bad contents
    pub fn load(start: &Path) -> Result<LoadedConfig, ConfigError> {
        let mvn_dir = Self::find_mvn_dir(start)?;
        let path = mvn_dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Err(ConfigError::NotFound { path });
        }

        let config = Self::read_config(&path)?;
        config.validate()?;

        let execution_root = mvn_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| mvn_dir.clone());

        Ok(LoadedConfig {
            config,
            path,
            execution_root,
        })
    }

    /// Walk up from `start` until a directory containing `.mvn` is found.
    ///
    /// Returns the path of the `.mvn` directory itself.
    pub fn find_mvn_dir(start: &Path) -> Result<PathBuf, ConfigError> {
        start
            .ancestors()
            .map(|dir| dir.join(MVN_DIR))
            .find(|candidate| candidate.is_dir())
            .ok_or_else(|| ConfigError::MvnDirNotFound {
                start: start.to_path_buf(),
            })
    }

    /// Read and parse a configuration file.
    pub fn read_config(path: &Path) -> Result<Configuration, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
