//! core
//!
//! Core domain types and versioning logic.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefType, RefSituation, ProjectCoordinate
//! - [`version`] - Version ordering for tags
//! - [`config`] - Configuration schema and loading
//! - [`options`] - Runtime options and their precedence
//! - [`resolve`] - Choosing the ref and rule for a session
//! - [`placeholder`] - Placeholder context and template rendering
//! - [`graph`] - Related-project discovery
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Resolution and rendering are deterministic

pub mod config;
pub mod graph;
pub mod options;
pub mod placeholder;
pub mod resolve;
pub mod types;
pub mod version;
