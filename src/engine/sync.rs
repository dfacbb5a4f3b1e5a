//! engine::sync
//!
//! Applies the resolved version to a project model and mirrors every change
//! onto the textual descriptor.
//!
//! # Order
//!
//! 1. Parent reference version (when the parent is related) and the
//!    project's own version
//! 2. Properties named by the matched rule, in the project and each profile
//! 3. Versions of related dependencies and plugins, including management
//!    sections and profiles
//! 4. The same edits on the text, pairing list entries by position
//!
//! # Invariants
//!
//! - Textual lists must have the same length and the same entry keys as
//!   the model lists; otherwise synchronization fails with
//!   [`VersioningError::StructuralMismatch`]
//! - Elements whose value does not change are left byte-identical
//! - The original file is never written here

use std::path::Path;

use tracing::{debug, info};

use super::error::VersioningError;
use crate::core::config::PropertyRule;
use crate::core::graph::RelatedProjectSet;
use crate::core::placeholder::{render, render_version, PlaceholderContext};
use crate::core::resolve::ResolvedVersion;
use crate::core::types::ProjectCoordinate;
use crate::pom::model::DEFAULT_PROFILE_ID;
use crate::pom::{Dependency, ElementId, ModelBase, Plugin, ProjectModel, XmlDocument};

/// Synchronizes descriptors against one resolved version.
#[derive(Debug, Clone, Copy)]
pub struct Synchronizer<'a> {
    resolved: &'a ResolvedVersion,
    context: &'a PlaceholderContext,
    related: &'a RelatedProjectSet,
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        resolved: &'a ResolvedVersion,
        context: &'a PlaceholderContext,
        related: &'a RelatedProjectSet,
    ) -> Self {
        Self {
            resolved,
            context,
            related,
        }
    }

    /// Update `model`, mirror the edits onto `document` and return the
    /// derived descriptor text.
    pub fn apply(
        &self,
        model: &mut ProjectModel,
        document: &mut XmlDocument,
    ) -> Result<String, VersioningError> {
        self.update_model(model)?;
        self.mirror(model, document)?;
        Ok(document.render())
    }

    /// Version derived from a coordinate's original version.
    pub fn version_for(&self, original: &str) -> Result<String, VersioningError> {
        let context = self.context.for_version(original);
        Ok(render_version(self.resolved.version_format(), &context)?)
    }

    fn version_of(
        &self,
        model: &ProjectModel,
        coordinate: &ProjectCoordinate,
    ) -> Result<String, VersioningError> {
        let original = coordinate
            .version
            .as_deref()
            .ok_or_else(|| VersioningError::UnresolvableVersion {
                path: model.pom_file.clone(),
                coordinate: coordinate.to_string(),
            })?;
        self.version_for(original)
    }

    fn property_rules(&self) -> &[PropertyRule] {
        &self.resolved.rule.property
    }

    // ---- model ----

    /// Apply the resolved version to the project model.
    pub fn update_model(&self, model: &mut ProjectModel) -> Result<(), VersioningError> {
        let original = model.coordinate();
        let original_version = match original.version.as_deref() {
            Some(version) => version.to_string(),
            None => {
                return Err(VersioningError::UnresolvableVersion {
                    path: model.pom_file.clone(),
                    coordinate: original.to_string(),
                })
            }
        };

        if let Some(parent) = &model.parent {
            let coordinate = parent.coordinate();
            if self.related.contains(&coordinate) {
                let version = self.version_of(model, &coordinate)?;
                debug!(parent = %coordinate.project_id(), %version, "set parent version");
                if let Some(parent) = model.parent.as_mut() {
                    parent.version = Some(version);
                }
            }
        }

        if model.version.is_some() {
            let version = self.version_for(&original_version)?;
            model.version = Some(version);
        }
        info!(
            "project version: {}",
            model.coordinate().version.unwrap_or_default()
        );

        let path = model.pom_file.clone();
        self.update_base(&path, "", &mut model.base, &original_version)?;
        for profile in &mut model.profiles {
            let label = format!("profile {} ", profile.id);
            self.update_base(&path, &label, &mut profile.base, &original_version)?;
        }

        Ok(())
    }

    fn update_base(
        &self,
        path: &Path,
        label: &str,
        base: &mut ModelBase,
        original_version: &str,
    ) -> Result<(), VersioningError> {
        let context = self.context.for_version(original_version);
        let mut header = true;
        for rule in self.property_rules() {
            let Some(current) = base.property(&rule.name) else {
                continue;
            };
            let value = render(&rule.value_format, &context.with_value(current))?;
            if value != current {
                if header {
                    info!("{}properties:", label);
                    header = false;
                }
                info!("  {}: {}", rule.name, value);
                base.set_property(&rule.name, value);
            }
        }

        for dependency in base
            .dependencies
            .iter_mut()
            .chain(base.dependency_management.iter_mut())
            .filter(|dependency| dependency.version.is_some())
        {
            if let Some(version) = self.related_version(path, label, &dependency.coordinate())? {
                dependency.version = Some(version);
            }
        }
        for plugin in base
            .plugins
            .iter_mut()
            .chain(base.plugin_management.iter_mut())
            .chain(base.reporting_plugins.iter_mut())
            .filter(|plugin| plugin.version.is_some())
        {
            if let Some(version) = self.related_version(path, label, &plugin.coordinate())? {
                plugin.version = Some(version);
            }
        }

        Ok(())
    }

    /// New version for a declared reference, or `None` when it is not related.
    fn related_version(
        &self,
        path: &Path,
        label: &str,
        coordinate: &ProjectCoordinate,
    ) -> Result<Option<String>, VersioningError> {
        if !self.related.contains(coordinate) {
            return Ok(None);
        }
        let original = coordinate
            .version
            .as_deref()
            .ok_or_else(|| VersioningError::UnresolvableVersion {
                path: path.to_path_buf(),
                coordinate: coordinate.to_string(),
            })?;
        let version = self.version_for(original)?;
        debug!("{}{}: set version to {}", label, coordinate.project_id(), version);
        Ok(Some(version))
    }

    // ---- text ----

    /// Reproduce the model's version-bearing values on the textual mirror.
    pub fn mirror(
        &self,
        model: &ProjectModel,
        document: &mut XmlDocument,
    ) -> Result<(), VersioningError> {
        let root = document.root();
        let mirror = Mirror {
            path: &model.pom_file,
            rules: self.property_rules(),
        };

        if let (Some(parent), Some(element)) = (&model.parent, document.child(root, "parent")) {
            if let (Some(version), Some(text)) = (&parent.version, document.child(element, "version"))
            {
                document.set_text_if_changed(text, version);
            }
        }
        if let (Some(version), Some(text)) = (&model.version, document.child(root, "version")) {
            document.set_text_if_changed(text, version);
        }

        mirror.base(document, root, "", &model.base)?;

        if let Some(profiles) = document.child(root, "profiles") {
            // Paired by position, so duplicate ids still map one to one.
            let elements: Vec<ElementId> = document.children_named(profiles, "profile").collect();
            if elements.len() != model.profiles.len() {
                return Err(mirror.mismatch(
                    "profiles",
                    format!(
                        "descriptor has {} profiles, project model has {}",
                        elements.len(),
                        model.profiles.len()
                    ),
                ));
            }
            for (element, profile) in elements.into_iter().zip(&model.profiles) {
                let id = document
                    .child_text(element, "id")
                    .unwrap_or(DEFAULT_PROFILE_ID)
                    .to_string();
                if id != profile.id {
                    return Err(mirror.mismatch(
                        "profiles",
                        format!("profile '{}' does not match model profile '{}'", id, profile.id),
                    ));
                }
                mirror.base(document, element, &format!("profile {} ", id), &profile.base)?;
            }
        }

        Ok(())
    }
}

/// Text-side pairing for one descriptor.
struct Mirror<'a> {
    path: &'a Path,
    rules: &'a [PropertyRule],
}

impl Mirror<'_> {
    fn mismatch(&self, section: &str, message: String) -> VersioningError {
        VersioningError::StructuralMismatch {
            path: self.path.to_path_buf(),
            section: section.to_string(),
            message,
        }
    }

    fn base(
        &self,
        document: &mut XmlDocument,
        element: ElementId,
        label: &str,
        base: &ModelBase,
    ) -> Result<(), VersioningError> {
        if let Some(properties) = document.child(element, "properties") {
            for rule in self.rules {
                if let (Some(text), Some(value)) =
                    (document.child(properties, &rule.name), base.property(&rule.name))
                {
                    document.set_text_if_changed(text, value);
                }
            }
        }

        let sections: [(&[&str], &[Dependency]); 2] = [
            (&["dependencies"][..], base.dependencies.as_slice()),
            (
                &["dependencyManagement", "dependencies"][..],
                base.dependency_management.as_slice(),
            ),
        ];
        for (path, dependencies) in sections {
            let section = format!("{}{}", label, path.join("."));
            let entries = self.pair(document, element, path, "dependency", dependencies.len(), &section)?;
            for (entry, dependency) in entries.into_iter().zip(dependencies) {
                let key = Dependency::from_element(document, entry).key();
                if key != dependency.key() {
                    return Err(self.mismatch(
                        &section,
                        format!("expected dependency {} but found {}", dependency.key(), key),
                    ));
                }
                Self::set_version(document, entry, dependency.version.as_deref());
            }
        }

        let sections: [(&[&str], &[Plugin]); 3] = [
            (&["build", "plugins"][..], base.plugins.as_slice()),
            (
                &["build", "pluginManagement", "plugins"][..],
                base.plugin_management.as_slice(),
            ),
            (&["reporting", "plugins"][..], base.reporting_plugins.as_slice()),
        ];
        for (path, plugins) in sections {
            let section = format!("{}{}", label, path.join("."));
            let entries = self.pair(document, element, path, "plugin", plugins.len(), &section)?;
            for (entry, plugin) in entries.into_iter().zip(plugins) {
                let key = Plugin::from_element(document, entry).key();
                if key != plugin.key() {
                    return Err(self.mismatch(
                        &section,
                        format!("expected plugin {} but found {}", plugin.key(), key),
                    ));
                }
                Self::set_version(document, entry, plugin.version.as_deref());
            }
        }

        Ok(())
    }

    /// Textual entries of a list section, checked against the model length.
    fn pair(
        &self,
        document: &XmlDocument,
        element: ElementId,
        path: &[&str],
        item: &str,
        expected: usize,
        section: &str,
    ) -> Result<Vec<ElementId>, VersioningError> {
        let entries: Vec<ElementId> = document
            .descend(element, path)
            .map(|list| document.children_named(list, item).collect())
            .unwrap_or_default();
        if entries.len() != expected {
            return Err(self.mismatch(
                section,
                format!(
                    "model has {} {} entries, descriptor has {}",
                    expected,
                    item,
                    entries.len()
                ),
            ));
        }
        Ok(entries)
    }

    fn set_version(document: &mut XmlDocument, entry: ElementId, version: Option<&str>) {
        if let (Some(version), Some(text)) = (version, document.child(entry, "version")) {
            document.set_text_if_changed(text, version);
        }
    }
}
