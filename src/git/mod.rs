//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the only doorway to Git. No other module imports `git2`.
//! Access is read-only: versioning never writes refs or objects.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - HEAD commit, commit time and current branch
//! - Tags pointing at HEAD
//! - Working tree cleanliness

mod interface;

pub use interface::{Git, GitError, HeadCommit};
