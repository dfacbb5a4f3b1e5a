//! pom
//!
//! Project descriptor I/O.
//!
//! A descriptor is read twice: into a [`model::ProjectModel`] that the
//! versioning logic mutates, and into an [`xml::XmlDocument`] that mirrors
//! the file's exact text. Both come from the same parse, so positional
//! pairing between them is stable.

pub mod model;
pub mod xml;

pub use model::{Dependency, ModelBase, Parent, Plugin, Profile, ProjectModel, Property};
pub use xml::{ElementId, XmlDocument};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Conventional descriptor file name.
pub const POM_FILE_NAME: &str = "pom.xml";

/// File name of the derived descriptor written next to the original.
pub const VERSIONED_POM_FILE_NAME: &str = ".git-versioned-pom.xml";

/// Parent lookup path used when `<relativePath>` is absent.
pub const DEFAULT_PARENT_RELATIVE_PATH: &str = "../pom.xml";

/// Errors from descriptor operations.
#[derive(Debug, Error)]
pub enum PomError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed XML: {message}")]
    Xml { message: String },

    #[error("failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

impl PomError {
    /// Attach the descriptor path to an XML error.
    pub fn at(self, path: &Path) -> Self {
        match self {
            PomError::Xml { message } => PomError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        }
    }
}

/// Resolve a module or parent path relative to `dir`.
///
/// A path naming a directory (or lacking a file extension) points at the
/// `pom.xml` inside it.
///
/// # Example
///
/// ```
/// use git_versioning::pom::pom_file;
/// use std::path::Path;
///
/// assert_eq!(pom_file(Path::new("/p"), "core"), Path::new("/p/core/pom.xml"));
/// assert_eq!(pom_file(Path::new("/p"), "alt.xml"), Path::new("/p/alt.xml"));
/// ```
pub fn pom_file(dir: &Path, relative: &str) -> PathBuf {
    let path = dir.join(relative.trim());
    if path.is_dir() || path.extension().is_none() {
        path.join(POM_FILE_NAME)
    } else {
        path
    }
}
