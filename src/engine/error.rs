//! engine::error
//!
//! Errors raised while versioning a project.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::placeholder::PlaceholderError;
use crate::git::GitError;
use crate::pom::PomError;

/// Errors from a versioning session.
///
/// A session that is disabled (explicit option, no repository) is not an
/// error; see [`crate::engine::Session`].
#[derive(Debug, Error)]
pub enum VersioningError {
    /// No `.mvn` directory or no configuration file.
    #[error("configuration not found: {0}")]
    ConfigurationNotFound(#[source] ConfigError),

    /// Configuration exists but can not be used.
    #[error(transparent)]
    Config(ConfigError),

    #[error("git error: {0}")]
    Git(#[from] GitError),

    #[error(transparent)]
    Pom(#[from] PomError),

    #[error(transparent)]
    UndefinedPlaceholder(#[from] PlaceholderError),

    /// The textual descriptor does not line up with the project model.
    #[error("{path}: {section}: {message}")]
    StructuralMismatch {
        /// Descriptor being synchronized
        path: PathBuf,
        /// Section where pairing failed, e.g. `profile ci dependencies`
        section: String,
        message: String,
    },

    /// A related coordinate carries no version to derive from.
    #[error("can not determine version of {coordinate} in {path}")]
    UnresolvableVersion {
        path: PathBuf,
        coordinate: String,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ConfigError> for VersioningError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MvnDirNotFound { .. } | ConfigError::NotFound { .. } => {
                VersioningError::ConfigurationNotFound(err)
            }
            other => VersioningError::Config(other),
        }
    }
}
