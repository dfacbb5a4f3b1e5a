//! git-versioning - Derive Maven project versions from git
//!
//! git-versioning reads the state of the repository HEAD (branch, tags,
//! commit, cleanliness), picks a version rule from `.mvn/git-versioning.toml`
//! and writes a derived `.git-versioned-pom.xml` for every project of the
//! build, with the project, parent, dependency and plugin versions of related
//! projects rewritten consistently.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Versioning session: resolve once, then synchronize each descriptor
//! - [`core`] - Configuration, ref resolution, placeholders and the related-project graph
//! - [`git`] - Single read-only interface to the repository
//! - [`pom`] - Project descriptor model and the editable XML text
//! - [`ui`] - Output and logging setup
//!
//! # Invariants
//!
//! 1. The repository is never modified
//! 2. A derived descriptor differs from its original only in version text
//! 3. Only related projects have their references rewritten
//! 4. A disabled session leaves every file untouched

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod pom;
pub mod ui;
