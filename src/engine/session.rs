//! engine::session
//!
//! One versioning session: everything resolved once, then applied to each
//! project descriptor of the build.
//!
//! # Lifecycle
//!
//! ```text
//! Context -> Session::resolve -> attach_root (related projects)
//!         -> process(pom) for the root and every registered module
//! ```
//!
//! Per project: Unprocessed -> Resolved -> Synchronized -> Written. A
//! failure aborts that project; the derived descriptor is written through a
//! temp file and a rename, so it is either complete or untouched.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::VersioningError;
use super::sync::Synchronizer;
use super::Context;
use crate::core::config::{Config, LoadedConfig};
use crate::core::graph::{discover, Boundaries, RelatedProjectSet};
use crate::core::options::RuntimeOptions;
use crate::core::placeholder::{git_properties, PlaceholderContext};
use crate::core::resolve::{resolve, ResolvedVersion};
use crate::core::types::RefSituation;
use crate::git::{Git, GitError};
use crate::pom::{ProjectModel, VERSIONED_POM_FILE_NAME};

/// Why a session does not version anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    /// `versioning.disable` build parameter or environment variable
    Option,
    /// `disable = true` in the configuration file
    Config,
    /// The working directory is not inside a git work tree
    NoRepository,
    /// The repository has no commits yet
    UnbornHead,
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DisabledReason::Option => "versioning is disabled by command option",
            DisabledReason::Config => "versioning is disabled by config option",
            DisabledReason::NoRepository => "project is not part of a git repository",
            DisabledReason::UnbornHead => "repository has no commits",
        };
        f.write_str(text)
    }
}

/// What happened to a processed descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Derived descriptor written
    Versioned,
    /// Already versioned earlier in this session
    Cached,
    /// Passed through unchanged
    Skipped(SkipReason),
}

/// Why a descriptor was passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled(DisabledReason),
    /// Neither the session root nor a module of a processed project
    NotAModule,
    /// Neither the project nor its parent declares a version
    NoVersion,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled(reason) => write!(f, "{}", reason),
            SkipReason::NotAModule => f.write_str("not a module of the session root"),
            SkipReason::NoVersion => f.write_str("can not determine project version"),
        }
    }
}

/// A descriptor after processing.
#[derive(Debug, Clone)]
pub struct Processed {
    pub model: ProjectModel,
    pub status: ProcessStatus,
}

/// A versioning session.
#[derive(Debug)]
pub enum Session {
    /// Descriptors pass through unchanged.
    Disabled(DisabledReason),
    Active(Box<ActiveSession>),
}

/// State of an enabled session.
#[derive(Debug)]
pub struct ActiveSession {
    config: LoadedConfig,
    situation: RefSituation,
    resolved: ResolvedVersion,
    prefer_tags: bool,
    update_pom: bool,
    context: PlaceholderContext,
    git_properties: BTreeMap<String, String>,
    related: RelatedProjectSet,
    /// Canonical descriptor paths allowed to be processed
    modules: HashSet<PathBuf>,
    /// Processed models by canonical descriptor path
    cache: HashMap<PathBuf, ProjectModel>,
}

impl Session {
    /// Load configuration, read the repository and resolve the version.
    ///
    /// # Errors
    ///
    /// - [`VersioningError::ConfigurationNotFound`] without `.mvn` directory
    ///   or configuration file
    /// - [`VersioningError::Git`] when the repository can not be read
    pub fn resolve(ctx: &Context) -> Result<Self, VersioningError> {
        let loaded = Config::load(&ctx.cwd)?;
        debug!(path = %loaded.path.display(), "configuration loaded");
        debug!(root = %loaded.execution_root.display(), "execution root");

        let options = RuntimeOptions::resolve(&ctx.params, &ctx.env);
        if options.disabled(&loaded.config) {
            let reason = if options.disable.is_some() {
                DisabledReason::Option
            } else {
                DisabledReason::Config
            };
            info!("skip - {}", reason);
            return Ok(Session::Disabled(reason));
        }

        let git = match Git::open(&ctx.cwd) {
            Ok(git) => git,
            Err(GitError::NotARepo { .. } | GitError::BareRepo) => {
                warn!("skip - {}", DisabledReason::NoRepository);
                return Ok(Session::Disabled(DisabledReason::NoRepository));
            }
            Err(e) => return Err(e.into()),
        };
        let Some(mut situation) = git.ref_situation()? else {
            warn!("skip - {}", DisabledReason::UnbornHead);
            return Ok(Session::Disabled(DisabledReason::UnbornHead));
        };

        if let Some(tag) = &options.git_tag {
            debug!(%tag, "set git head tag by command option");
            situation = situation.with_tag_override(tag);
        }
        if let Some(branch) = &options.git_branch {
            debug!(%branch, "set git head branch by command option");
            situation = situation.with_branch_override(branch);
        }
        debug!(
            root = %situation.root_dir.display(),
            commit = %situation.head_commit,
            timestamp = situation.head_commit_timestamp,
            branch = ?situation.branch,
            tags = ?situation.tags,
            clean = situation.clean,
            "git situation"
        );

        let prefer_tags = options.prefer_tags(&loaded.config);
        debug!(prefer_tags, "option");
        let resolved = resolve(&situation, &loaded.config, prefer_tags);
        info!("git ref: {} ({})", resolved.ref_name, resolved.ref_type);

        let update_pom = options.update_pom(&loaded.config, &resolved.rule);
        debug!(update_pom, "option");

        let context = PlaceholderContext::global(&situation, &resolved, &ctx.params, &ctx.env);
        let git_properties = git_properties(&situation, &resolved);

        Ok(Session::Active(Box::new(ActiveSession {
            config: loaded,
            situation,
            resolved,
            prefer_tags,
            update_pom,
            context,
            git_properties,
            related: RelatedProjectSet::new(),
            modules: HashSet::new(),
            cache: HashMap::new(),
        })))
    }

    /// Resolve the session and attach `root_pom` as the session root.
    pub fn start(ctx: &Context, root_pom: &Path) -> Result<Self, VersioningError> {
        let mut session = Self::resolve(ctx)?;
        if let Session::Active(active) = &mut session {
            active.attach_root(root_pom)?;
        }
        Ok(session)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Session::Disabled(_))
    }

    /// Version a single descriptor.
    ///
    /// Returns the model unchanged when the session is disabled, the
    /// descriptor is not a registered module or no version can be
    /// determined.
    pub fn process(&mut self, pom: &Path) -> Result<Processed, VersioningError> {
        match self {
            Session::Disabled(reason) => Ok(Processed {
                model: ProjectModel::read(pom)?,
                status: ProcessStatus::Skipped(SkipReason::Disabled(*reason)),
            }),
            Session::Active(active) => active.process(pom),
        }
    }

    /// Process `root_pom` and, transitively, every module it declares.
    pub fn process_all(&mut self, root_pom: &Path) -> Result<Vec<Processed>, VersioningError> {
        let mut results = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root_pom.to_path_buf()]);

        while let Some(pom) = queue.pop_front() {
            if !seen.insert(canonical(&pom)) {
                continue;
            }
            let processed = self.process(&pom)?;
            if !matches!(processed.status, ProcessStatus::Skipped(SkipReason::NotAModule)) {
                queue.extend(processed.model.module_pom_files());
            }
            results.push(processed);
        }

        Ok(results)
    }
}

impl ActiveSession {
    /// Discover related projects from the session root and register it
    /// for processing.
    pub fn attach_root(&mut self, root_pom: &Path) -> Result<(), VersioningError> {
        let root = ProjectModel::read(root_pom)?;
        let bounds = Boundaries::new(&self.config.execution_root, &self.situation.root_dir);
        self.related = discover(&root, &bounds)?;

        debug!("related projects:");
        for project in self.related.sorted() {
            debug!("  {}", project);
        }

        self.modules.insert(canonical(root_pom));
        Ok(())
    }

    pub fn situation(&self) -> &RefSituation {
        &self.situation
    }

    pub fn resolved(&self) -> &ResolvedVersion {
        &self.resolved
    }

    pub fn config(&self) -> &LoadedConfig {
        &self.config
    }

    pub fn prefer_tags(&self) -> bool {
        self.prefer_tags
    }

    pub fn update_pom(&self) -> bool {
        self.update_pom
    }

    /// Version derived for a project whose original version is `original`.
    pub fn version_for(&self, original: &str) -> Result<String, VersioningError> {
        Synchronizer::new(&self.resolved, &self.context, &self.related).version_for(original)
    }

    fn process(&mut self, pom: &Path) -> Result<Processed, VersioningError> {
        let key = canonical(pom);
        if !self.modules.contains(&key) {
            debug!(pom = %pom.display(), "skip model - non project module");
            return Ok(Processed {
                model: ProjectModel::read(pom)?,
                status: ProcessStatus::Skipped(SkipReason::NotAModule),
            });
        }

        let (mut model, mut document) = ProjectModel::read_with_document(pom)?;
        let coordinate = model.coordinate();
        if coordinate.version.is_none() {
            debug!(pom = %pom.display(), "skip model - can not determine project version");
            return Ok(Processed {
                model,
                status: ProcessStatus::Skipped(SkipReason::NoVersion),
            });
        }

        if let Some(cached) = self.cache.get(&key) {
            return Ok(Processed {
                model: cached.clone(),
                status: ProcessStatus::Cached,
            });
        }

        info!("--- {} ---", coordinate.project_id());

        let synchronizer = Synchronizer::new(&self.resolved, &self.context, &self.related);
        let derived = synchronizer.apply(&mut model, &mut document)?;

        for (name, value) in &self.git_properties {
            model.base.set_property(name, value.as_str());
        }

        let versioned_pom = model.project_dir().join(VERSIONED_POM_FILE_NAME);
        debug!(path = %versioned_pom.display(), "generate");
        write_atomic(&versioned_pom, &derived)?;
        if self.update_pom {
            debug!("updating original POM file");
            write_atomic(&model.pom_file, &derived)?;
        }
        model.versioned_pom = Some(versioned_pom);

        for module in model.module_pom_files() {
            self.modules.insert(canonical(&module));
        }
        self.cache.insert(key, model.clone());

        Ok(Processed {
            model,
            status: ProcessStatus::Versioned,
        })
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Write `contents` to a temp file next to `path`, then rename it over `path`.
fn write_atomic(path: &Path, contents: &str) -> Result<(), VersioningError> {
    let write_error = |source: std::io::Error| VersioningError::Write {
        path: path.to_path_buf(),
        source,
    };
    let temp_path = path.with_extension("tmp");

    let result = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));

    if let Err(err) = result {
        // The temp file may not exist if opening it failed.
        let _ = fs::remove_file(&temp_path);
        return Err(write_error(err));
    }
    Ok(())
}
