//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefType`] - Which kind of ref identifies the build
//! - [`RefSituation`] - Snapshot of HEAD supplied by the git adapter
//! - [`ProjectCoordinate`] - group/artifact/version identity of a project
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use git_versioning::core::types::{Oid, ProjectCoordinate};
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.short(7), "abc123d");
//!
//! // Coordinates compare on group and artifact only
//! let a = ProjectCoordinate::new("org.example", "core", Some("1.0"));
//! let b = ProjectCoordinate::new("org.example", "core", Some("2.0"));
//! assert_eq!(a, b);
//! assert!(!a.matches_exactly(&b));
//! ```

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A Git object identifier (SHA-1 or SHA-256 hex string).
///
/// # Example
///
/// ```
/// use git_versioning::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert!(Oid::new("not-a-sha").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters, or the full OID if shorter.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of ref a build version was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Branch,
    Tag,
    Commit,
}

impl RefType {
    /// Lower-case name, also used as a placeholder key (`${branch}`, `${tag}`, `${commit}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            RefType::Branch => "branch",
            RefType::Tag => "tag",
            RefType::Commit => "commit",
        }
    }

    /// Version format used when no configured rule matched.
    pub fn default_version_format(&self) -> &'static str {
        match self {
            RefType::Branch => "${branch}-SNAPSHOT",
            RefType::Tag => "${tag}",
            RefType::Commit => "${commit}",
        }
    }
}

impl std::fmt::Display for RefType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the repository HEAD for one session.
///
/// Produced once by [`crate::git::Git::ref_situation`] and never mutated
/// afterwards, apart from the explicit overrides applied while the session
/// is being set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefSituation {
    /// Commit HEAD points at
    pub head_commit: Oid,
    /// Commit time in seconds since the epoch (0 if unknown)
    pub head_commit_timestamp: i64,
    /// Current branch; `None` when HEAD is detached
    pub branch: Option<String>,
    /// Tags pointing at HEAD, in repository order
    pub tags: Vec<String>,
    /// Whether the working tree has no changes
    pub clean: bool,
    /// Root of the working tree
    pub root_dir: PathBuf,
}

impl RefSituation {
    /// HEAD is detached when no branch is checked out.
    pub fn is_detached(&self) -> bool {
        self.branch.is_none()
    }

    /// Force the situation onto a single tag.
    ///
    /// Clears the branch, so the situation becomes detached. An empty tag
    /// clears the tag list instead.
    pub fn with_tag_override(mut self, tag: &str) -> Self {
        self.branch = None;
        self.tags = if tag.is_empty() {
            Vec::new()
        } else {
            vec![tag.to_string()]
        };
        self
    }

    /// Force the branch name. Tags are left as they are.
    pub fn with_branch_override(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }
}

/// Identity of a project, or of a reference to one.
///
/// Equality and hashing only consider group and artifact; the version is
/// carried along so that callers can compare it explicitly with
/// [`ProjectCoordinate::matches_exactly`].
#[derive(Debug, Clone, Serialize)]
pub struct ProjectCoordinate {
    /// Maven groupId
    pub group: String,
    /// Maven artifactId
    pub artifact: String,
    /// Declared version, if any
    pub version: Option<String>,
}

impl ProjectCoordinate {
    /// Create a coordinate.
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: Option<impl Into<String>>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.map(Into::into),
        }
    }

    /// `group:artifact`, the key used in log output.
    pub fn project_id(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Compare group, artifact and version.
    pub fn matches_exactly(&self, other: &ProjectCoordinate) -> bool {
        self == other && self.version == other.version
    }
}

impl PartialEq for ProjectCoordinate {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group && self.artifact == other.artifact
    }
}

impl Eq for ProjectCoordinate {}

impl Hash for ProjectCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group.hash(state);
        self.artifact.hash(state);
    }
}

impl std::fmt::Display for ProjectCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.artifact, version),
            None => write!(f, "{}:{}", self.group, self.artifact),
        }
    }
}
