//! pom::model
//!
//! Structured project model read from a descriptor.
//!
//! Only the parts that carry versions or graph edges are modelled: the
//! project and parent coordinates, modules, properties, dependencies,
//! plugins and profiles. Everything else stays in the textual mirror.

use std::fs;
use std::path::{Path, PathBuf};

use super::xml::{ElementId, XmlDocument};
use super::{pom_file, PomError, DEFAULT_PARENT_RELATIVE_PATH};
use crate::core::types::ProjectCoordinate;

/// Group assumed for plugins that declare none.
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// Dependency type assumed when none is declared.
pub const DEFAULT_DEPENDENCY_TYPE: &str = "jar";

/// Profile id assumed when none is declared.
pub const DEFAULT_PROFILE_ID: &str = "default";

/// A parsed project descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectModel {
    /// Descriptor the model was read from
    pub pom_file: PathBuf,
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub parent: Option<Parent>,
    /// Project-level sections
    pub base: ModelBase,
    pub profiles: Vec<Profile>,
    /// Derived descriptor that replaces `pom_file` for the rest of the build
    pub versioned_pom: Option<PathBuf>,
}

/// Parent reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Parent {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub relative_path: Option<String>,
}

/// Sections shared by a project and its profiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBase {
    pub modules: Vec<String>,
    pub properties: Vec<Property>,
    pub dependencies: Vec<Dependency>,
    pub dependency_management: Vec<Dependency>,
    pub plugins: Vec<Plugin>,
    pub plugin_management: Vec<Plugin>,
    pub reporting_plugins: Vec<Plugin>,
}

/// A `<properties>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// A dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    /// `<type>`
    pub kind: Option<String>,
    pub classifier: Option<String>,
}

/// A build, plugin-management or reporting plugin declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
}

/// A `<profile>` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: String,
    pub base: ModelBase,
}

fn owned_text(doc: &XmlDocument, id: ElementId, name: &str) -> Option<String> {
    doc.child_text(id, name).map(str::to_string)
}

impl ProjectModel {
    /// Read and parse a descriptor file.
    pub fn read(path: &Path) -> Result<Self, PomError> {
        let (model, _) = Self::read_with_document(path)?;
        Ok(model)
    }

    /// Read a descriptor file into both its model and its textual mirror.
    pub fn read_with_document(path: &Path) -> Result<(Self, XmlDocument), PomError> {
        let source = fs::read_to_string(path).map_err(|e| PomError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let document = XmlDocument::parse(source).map_err(|e| e.at(path))?;
        let model = Self::from_document(path, &document)?;
        Ok((model, document))
    }

    /// Build the model from a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`PomError::Parse`] when the root element is not `project`
    /// or the project has no `artifactId`.
    pub fn from_document(path: &Path, doc: &XmlDocument) -> Result<Self, PomError> {
        let root = doc.root();
        let invalid = |message: &str| PomError::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        if doc.name(root) != "project" {
            return Err(invalid("root element is not <project>"));
        }
        let artifact_id =
            owned_text(doc, root, "artifactId").ok_or_else(|| invalid("missing <artifactId>"))?;

        let parent = match doc.child(root, "parent") {
            Some(parent) => Some(Parent {
                group_id: owned_text(doc, parent, "groupId")
                    .ok_or_else(|| invalid("parent is missing <groupId>"))?,
                artifact_id: owned_text(doc, parent, "artifactId")
                    .ok_or_else(|| invalid("parent is missing <artifactId>"))?,
                version: owned_text(doc, parent, "version"),
                relative_path: owned_text(doc, parent, "relativePath"),
            }),
            None => None,
        };

        let profiles = doc
            .child(root, "profiles")
            .map(|profiles| {
                doc.children_named(profiles, "profile")
                    .map(|profile| Profile {
                        id: owned_text(doc, profile, "id")
                            .unwrap_or_else(|| DEFAULT_PROFILE_ID.to_string()),
                        base: ModelBase::from_element(doc, profile),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            pom_file: path.to_path_buf(),
            group_id: owned_text(doc, root, "groupId"),
            artifact_id,
            version: owned_text(doc, root, "version"),
            parent,
            base: ModelBase::from_element(doc, root),
            profiles,
            versioned_pom: None,
        })
    }

    /// Directory containing the descriptor.
    pub fn project_dir(&self) -> &Path {
        self.pom_file.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Project coordinate, inheriting group and version from the parent
    /// reference when not declared.
    pub fn coordinate(&self) -> ProjectCoordinate {
        let parent = self.parent.as_ref();
        let group = self
            .group_id
            .clone()
            .or_else(|| parent.map(|p| p.group_id.clone()))
            .unwrap_or_default();
        let version = self
            .version
            .clone()
            .or_else(|| parent.and_then(|p| p.version.clone()));
        ProjectCoordinate::new(group, self.artifact_id.clone(), version)
    }

    /// Descriptor the parent reference points at, if it exists.
    pub fn parent_pom_file(&self) -> Option<PathBuf> {
        let parent = self.parent.as_ref()?;
        let relative = parent
            .relative_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .unwrap_or(DEFAULT_PARENT_RELATIVE_PATH);
        let path = pom_file(self.project_dir(), relative);
        path.exists().then_some(path)
    }

    /// Descriptors of all declared modules, including profile modules,
    /// without duplicates.
    pub fn module_pom_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        let modules = self
            .base
            .modules
            .iter()
            .chain(self.profiles.iter().flat_map(|p| p.base.modules.iter()));
        for module in modules {
            let path = pom_file(self.project_dir(), module);
            if !files.contains(&path) {
                files.push(path);
            }
        }
        files
    }

    /// Profile by id.
    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }
}

impl Parent {
    pub fn coordinate(&self) -> ProjectCoordinate {
        ProjectCoordinate::new(
            self.group_id.clone(),
            self.artifact_id.clone(),
            self.version.clone(),
        )
    }
}

impl ModelBase {
    /// Read the shared sections below a `<project>` or `<profile>` element.
    pub fn from_element(doc: &XmlDocument, element: ElementId) -> Self {
        let list = |path: &[&str], item: &'static str| -> Vec<ElementId> {
            doc.descend(element, path)
                .map(|parent| doc.children_named(parent, item).collect())
                .unwrap_or_default()
        };

        Self {
            modules: list(&["modules"], "module")
                .into_iter()
                .map(|id| doc.text(id).trim().to_string())
                .collect(),
            properties: doc
                .child(element, "properties")
                .map(|props| {
                    doc.children(props)
                        .iter()
                        .map(|id| Property {
                            name: doc.name(*id).to_string(),
                            value: doc.text(*id).trim().to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            dependencies: list(&["dependencies"], "dependency")
                .into_iter()
                .map(|id| Dependency::from_element(doc, id))
                .collect(),
            dependency_management: list(&["dependencyManagement", "dependencies"], "dependency")
                .into_iter()
                .map(|id| Dependency::from_element(doc, id))
                .collect(),
            plugins: list(&["build", "plugins"], "plugin")
                .into_iter()
                .map(|id| Plugin::from_element(doc, id))
                .collect(),
            plugin_management: list(&["build", "pluginManagement", "plugins"], "plugin")
                .into_iter()
                .map(|id| Plugin::from_element(doc, id))
                .collect(),
            reporting_plugins: list(&["reporting", "plugins"], "plugin")
                .into_iter()
                .map(|id| Plugin::from_element(doc, id))
                .collect(),
        }
    }

    /// Value of a property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.value.as_str())
    }

    /// Set a property, appending it when not yet declared.
    pub fn set_property(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(property) => property.value = value,
            None => self.properties.push(Property {
                name: name.to_string(),
                value,
            }),
        }
    }
}

impl Dependency {
    pub fn from_element(doc: &XmlDocument, element: ElementId) -> Self {
        Self {
            group_id: owned_text(doc, element, "groupId").unwrap_or_default(),
            artifact_id: owned_text(doc, element, "artifactId").unwrap_or_default(),
            version: owned_text(doc, element, "version"),
            kind: owned_text(doc, element, "type"),
            classifier: owned_text(doc, element, "classifier"),
        }
    }

    /// `group:artifact:type[:classifier]`, type defaulting to `jar`.
    pub fn key(&self) -> String {
        let kind = self.kind.as_deref().unwrap_or(DEFAULT_DEPENDENCY_TYPE);
        match &self.classifier {
            Some(classifier) => format!(
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, kind, classifier
            ),
            None => format!("{}:{}:{}", self.group_id, self.artifact_id, kind),
        }
    }

    pub fn coordinate(&self) -> ProjectCoordinate {
        ProjectCoordinate::new(
            self.group_id.clone(),
            self.artifact_id.clone(),
            self.version.clone(),
        )
    }
}

impl Plugin {
    pub fn from_element(doc: &XmlDocument, element: ElementId) -> Self {
        Self {
            group_id: owned_text(doc, element, "groupId"),
            artifact_id: owned_text(doc, element, "artifactId").unwrap_or_default(),
            version: owned_text(doc, element, "version"),
        }
    }

    /// Group, or the default plugin group.
    pub fn group(&self) -> &str {
        self.group_id.as_deref().unwrap_or(DEFAULT_PLUGIN_GROUP)
    }

    /// `group:artifact`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group(), self.artifact_id)
    }

    pub fn coordinate(&self) -> ProjectCoordinate {
        ProjectCoordinate::new(
            self.group().to_string(),
            self.artifact_id.clone(),
            self.version.clone(),
        )
    }
}
