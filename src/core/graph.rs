//! core::graph
//!
//! Related-project discovery.
//!
//! # Architecture
//!
//! The build graph is walked once per session from the root project. Nodes
//! are project descriptors; edges come from three sources:
//! - the explicit parent reference (`<parent>` + `relativePath`)
//! - the directory hierarchy (a `pom.xml` one level up that lists the
//!   project as a module)
//! - declared modules, including per-profile module lists
//!
//! # Invariants
//!
//! - Each coordinate is visited at most once
//! - Only descriptors under both the execution root and the repository root
//!   are followed, through parent and module edges alike

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::types::ProjectCoordinate;
use crate::pom::{PomError, ProjectModel, POM_FILE_NAME};

/// Closed set of coordinates that share the session's version.
#[derive(Debug, Clone, Default)]
pub struct RelatedProjectSet {
    projects: HashSet<ProjectCoordinate>,
}

impl RelatedProjectSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a coordinate (group + artifact) belongs to the set.
    pub fn contains(&self, coordinate: &ProjectCoordinate) -> bool {
        self.projects.contains(coordinate)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Members sorted by `group:artifact`.
    pub fn sorted(&self) -> Vec<&ProjectCoordinate> {
        let mut projects: Vec<_> = self.projects.iter().collect();
        projects.sort_by(|a, b| (&a.group, &a.artifact).cmp(&(&b.group, &b.artifact)));
        projects
    }

    fn insert(&mut self, coordinate: ProjectCoordinate) -> bool {
        self.projects.insert(coordinate)
    }
}

impl FromIterator<ProjectCoordinate> for RelatedProjectSet {
    fn from_iter<I: IntoIterator<Item = ProjectCoordinate>>(iter: I) -> Self {
        Self {
            projects: iter.into_iter().collect(),
        }
    }
}

/// Directories a related descriptor must live under.
#[derive(Debug, Clone)]
pub struct Boundaries {
    execution_root: PathBuf,
    repository_root: PathBuf,
}

impl Boundaries {
    /// Both roots are canonicalized when possible.
    pub fn new(execution_root: &Path, repository_root: &Path) -> Self {
        Self {
            execution_root: canonical(execution_root),
            repository_root: canonical(repository_root),
        }
    }

    /// Whether `path` is a project descriptor inside both roots.
    ///
    /// Packaged `.pom` descriptors never qualify.
    pub fn is_related(&self, path: &Path) -> bool {
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "xml") {
            return false;
        }
        self.contains(path)
    }

    /// Whether `path` lies inside both roots, whether or not it exists.
    pub fn contains(&self, path: &Path) -> bool {
        let path = canonical(path);
        path.starts_with(&self.execution_root) && path.starts_with(&self.repository_root)
    }
}

/// Canonical form of `path`; missing trailing components are resolved
/// through the nearest existing ancestor.
fn canonical(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        if let Ok(existing) = ancestor.canonicalize() {
            return match path.strip_prefix(ancestor) {
                Ok(rest) => existing.join(rest),
                Err(_) => existing,
            };
        }
    }
    path.to_path_buf()
}

/// Walk the build graph from `root` and collect every related coordinate.
///
/// # Errors
///
/// Returns a [`PomError`] if a module descriptor, or a related parent
/// descriptor, can not be read.
pub fn discover(root: &ProjectModel, bounds: &Boundaries) -> Result<RelatedProjectSet, PomError> {
    let mut related = RelatedProjectSet::new();
    let mut pending = vec![root.clone()];

    while let Some(project) = pending.pop() {
        if !related.insert(project.coordinate()) {
            continue;
        }
        trace!(project = %project.coordinate(), "related project");

        // Modules are pushed first so that parents are explored first.
        for module in project.module_pom_files() {
            if !bounds.contains(&module) {
                trace!(module = %module.display(), "module outside roots");
                continue;
            }
            pending.push(ProjectModel::read(&module)?);
        }
        if let Some(parent) = directory_parent(&project, bounds)? {
            pending.push(parent);
        }
        if let Some(parent) = referenced_parent(&project, bounds)? {
            pending.push(parent);
        }
    }

    Ok(related)
}

/// Parent reached through `<parent>`, if it is related and declares exactly
/// the referenced coordinate.
fn referenced_parent(
    project: &ProjectModel,
    bounds: &Boundaries,
) -> Result<Option<ProjectModel>, PomError> {
    let (Some(reference), Some(path)) = (project.parent.as_ref(), project.parent_pom_file())
    else {
        return Ok(None);
    };
    if !bounds.is_related(&path) {
        return Ok(None);
    }

    let parent = ProjectModel::read(&path)?;
    Ok(parent
        .coordinate()
        .matches_exactly(&reference.coordinate())
        .then_some(parent))
}

/// Project one directory up that lists `project` as one of its modules.
fn directory_parent(
    project: &ProjectModel,
    bounds: &Boundaries,
) -> Result<Option<ProjectModel>, PomError> {
    let Some(parent_dir) = canonical(project.project_dir()).parent().map(Path::to_path_buf)
    else {
        return Ok(None);
    };
    let path = parent_dir.join(POM_FILE_NAME);
    if !bounds.is_related(&path) {
        return Ok(None);
    }

    let candidate = ProjectModel::read(&path)?;
    let own = canonical(&project.pom_file);
    let lists_project = candidate
        .module_pom_files()
        .iter()
        .any(|module| canonical(module) == own);
    Ok(lists_project.then_some(candidate))
}
