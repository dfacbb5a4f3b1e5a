//! git::interface
//!
//! The Git trait and implementation using git2.
//!
//! # Example
//!
//! ```no_run
//! use git_versioning::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new(".")).unwrap();
//! if let Some(situation) = git.ref_situation().unwrap() {
//!     println!("head {} on {:?}", situation.head_commit.short(7), situation.branch);
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Oid, RefSituation, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    fn from_git2(err: git2::Error, context: &str) -> Self {
        GitError::Internal {
            message: format!("{}: {}", context, err.message()),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(oid) => GitError::InvalidOid { oid },
        }
    }
}

/// Head commit id and commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadCommit {
    pub oid: Oid,
    /// Seconds since the epoch
    pub timestamp: i64,
}

/// Read-only view of a repository.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Root of the working directory.
    pub fn root_dir(&self) -> Result<PathBuf, GitError> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or(GitError::BareRepo)
    }

    /// Commit HEAD points at, or `None` when HEAD is unborn.
    pub fn head_commit(&self) -> Result<Option<HeadCommit>, GitError> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                return Ok(None)
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        let commit = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        Ok(Some(HeadCommit {
            oid: Oid::new(commit.id().to_string())?,
            timestamp: commit.time().seconds(),
        }))
    }

    /// Name of the checked-out branch; `None` for a detached or unborn HEAD.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(name.to_string()));
            }
        }

        Ok(None)
    }

    /// Tags whose target (peeled through annotated tag objects) is `commit`.
    pub fn tags_pointing_at(&self, commit: &Oid) -> Result<Vec<String>, GitError> {
        let refs = self
            .repo
            .references_glob("refs/tags/*")
            .map_err(|e| GitError::from_git2(e, "refs/tags"))?;

        let mut tags = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::from_git2(e, "refs/tags"))?;
            let Some(name) = reference.shorthand().map(str::to_string) else {
                continue;
            };
            // Tags on trees or blobs never point at a commit.
            let Ok(target) = reference.peel_to_commit() else {
                continue;
            };
            if target.id().to_string() == commit.as_str() {
                tags.push(name);
            }
        }
        tags.sort();
        Ok(tags)
    }

    /// Whether the working tree has no changes.
    ///
    /// Untracked files count as changes; ignored files do not.
    pub fn is_clean(&self) -> Result<bool, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, "status"))?;

        Ok(statuses.is_empty())
    }

    /// Everything versioning needs to know about HEAD.
    ///
    /// Returns `None` when HEAD is unborn.
    pub fn ref_situation(&self) -> Result<Option<RefSituation>, GitError> {
        let Some(head) = self.head_commit()? else {
            return Ok(None);
        };

        Ok(Some(RefSituation {
            tags: self.tags_pointing_at(&head.oid)?,
            head_commit: head.oid,
            head_commit_timestamp: head.timestamp,
            branch: self.current_branch()?,
            clean: self.is_clean()?,
            root_dir: self.root_dir()?,
        }))
    }
}
