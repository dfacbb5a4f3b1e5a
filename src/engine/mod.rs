//! engine
//!
//! Orchestrates a versioning session.
//!
//! # Architecture
//!
//! ```text
//! Context -> Session::resolve -> Session::start -> process / process_all
//!                                                   |
//!                                                   +-> Synchronizer::apply
//! ```
//!
//! The session resolves the ref situation, configuration and version once,
//! walks the build graph once, and then versions each registered project
//! descriptor at most once.
//!
//! # Invariants
//!
//! - A disabled session never writes a file
//! - Every version written into a model is mirrored onto the derived text
//! - The original descriptor is only replaced when `update_pom` is in effect
//!
//! # Example
//!
//! ```no_run
//! use git_versioning::engine::{Context, Session};
//! use std::path::Path;
//!
//! let ctx = Context::from_process(Path::new("/work/project"), Default::default());
//! let mut session = Session::start(&ctx, Path::new("/work/project/pom.xml")).unwrap();
//! for processed in session.process_all(Path::new("/work/project/pom.xml")).unwrap() {
//!     println!("{} {:?}", processed.model.coordinate(), processed.status);
//! }
//! ```

pub mod error;
pub mod session;
pub mod sync;

pub use error::VersioningError;
pub use session::{ActiveSession, DisabledReason, ProcessStatus, Processed, Session, SkipReason};
pub use sync::Synchronizer;

use std::path::{Path, PathBuf};

use crate::core::options::Params;

/// Inputs of one invocation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Directory the build runs in; the execution root is searched from here
    pub cwd: PathBuf,
    /// Build parameters (`-D key=value`)
    pub params: Params,
    /// Environment variables
    pub env: Params,
}

impl Context {
    pub fn new(cwd: impl Into<PathBuf>, params: Params, env: Params) -> Self {
        Self {
            cwd: cwd.into(),
            params,
            env,
        }
    }

    /// Context with the current process environment.
    pub fn from_process(cwd: &Path, params: Params) -> Self {
        Self::new(cwd, params, std::env::vars().collect())
    }
}
