//! Integration tests for versioning sessions.
//!
//! Each test builds a small multi-module Maven project inside a real git
//! repository and runs a session over it, checking the derived descriptors
//! written next to each `pom.xml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use git_versioning::core::options::{
    env_var_name, Params, OPTION_DISABLE, OPTION_GIT_BRANCH, OPTION_GIT_TAG,
};
use git_versioning::engine::{
    Context, DisabledReason, ProcessStatus, Session, SkipReason, VersioningError,
};
use git_versioning::pom::VERSIONED_POM_FILE_NAME;

// =============================================================================
// Test Fixtures
// =============================================================================

const COMMIT_TIME: &str = "1700000000 +0000";

const ROOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>

    <groupId>org.example</groupId>
    <artifactId>shop</artifactId>
    <version>1.0.0</version>
    <packaging>pom</packaging>

    <modules>
        <module>core</module>
        <module>app</module>
    </modules>

    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.example</groupId>
                <artifactId>shop-core</artifactId>
                <version>1.0.0</version>
            </dependency>
            <dependency>
                <groupId>org.example</groupId>
                <artifactId>shop-app</artifactId>
                <version>1.0.0</version>
            </dependency>
            <dependency>
                <groupId>junit</groupId>
                <artifactId>junit</artifactId>
                <version>4.13.2</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>
"#;

const CORE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>

    <parent>
        <groupId>org.example</groupId>
        <artifactId>shop</artifactId>
        <version>1.0.0</version>
    </parent>

    <artifactId>shop-core</artifactId>
</project>
"#;

const APP_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>

    <parent>
        <groupId>org.example</groupId>
        <artifactId>shop</artifactId>
        <version>1.0.0</version>
    </parent>

    <artifactId>shop-app</artifactId>

    <dependencies>
        <dependency>
            <groupId>org.example</groupId>
            <artifactId>shop-core</artifactId>
            <version>1.0.0</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>
"#;

/// A git repository holding the three-module `shop` project.
struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create the project with `config` as `.mvn/git-versioning.toml` and
    /// commit everything on `main`.
    fn new(config: &str) -> Self {
        let project = Self::files_only(config);
        run_git(project.path(), &["init", "-q", "-b", "main"]);
        run_git(project.path(), &["config", "user.email", "test@example.com"]);
        run_git(project.path(), &["config", "user.name", "Test User"]);
        project.commit_all("Initial commit");
        project
    }

    /// The project files without a git repository.
    fn files_only(config: &str) -> Self {
        let project = Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        };
        project.write(".mvn/git-versioning.toml", config);
        project.write(".gitignore", &format!("{}\n*.tmp\n", VERSIONED_POM_FILE_NAME));
        project.write("pom.xml", ROOT_POM);
        project.write("core/pom.xml", CORE_POM);
        project.write("app/pom.xml", APP_POM);
        project
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path().join(relative)).unwrap()
    }

    fn git(&self, args: &[&str]) {
        run_git(self.path(), args);
    }

    fn commit_all(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
    }

    fn root_pom(&self) -> PathBuf {
        self.path().join("pom.xml")
    }

    fn derived(&self, module: &str) -> PathBuf {
        self.path().join(module).join(VERSIONED_POM_FILE_NAME)
    }

    fn context(&self, params: &[(&str, &str)]) -> Context {
        Context::new(self.path(), to_params(params), Params::new())
    }

    /// Run a full session and return the derived root descriptor.
    fn apply(&self, params: &[(&str, &str)]) -> String {
        let mut session = Session::start(&self.context(params), &self.root_pom()).unwrap();
        session.process_all(&self.root_pom()).unwrap();
        self.read(VERSIONED_POM_FILE_NAME)
    }
}

fn to_params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_DATE", COMMIT_TIME)
        .env("GIT_COMMITTER_DATE", COMMIT_TIME)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

// =============================================================================
// Full Builds
// =============================================================================

#[test]
fn feature_branch_versions_every_module() {
    let project = TestProject::new("");
    project.git(&["checkout", "-q", "-b", "feature/login"]);

    let mut session = Session::start(&project.context(&[]), &project.root_pom()).unwrap();
    let results = session.process_all(&project.root_pom()).unwrap();

    assert_eq!(results.len(), 3);
    assert!(results
        .iter()
        .all(|processed| processed.status == ProcessStatus::Versioned));
    let versions: Vec<_> = results
        .iter()
        .map(|processed| processed.model.coordinate().to_string())
        .collect();
    assert_eq!(
        versions,
        vec![
            "org.example:shop:feature-login-SNAPSHOT",
            "org.example:shop-core:feature-login-SNAPSHOT",
            "org.example:shop-app:feature-login-SNAPSHOT",
        ]
    );

    // Originals are untouched.
    assert_eq!(project.read("pom.xml"), ROOT_POM);
    assert_eq!(project.read("app/pom.xml"), APP_POM);

    let root = project.read(VERSIONED_POM_FILE_NAME);
    assert_eq!(root.matches("feature-login-SNAPSHOT").count(), 3);
    assert!(root.contains("<version>4.13.2</version>"));

    let app = fs::read_to_string(project.derived("app")).unwrap();
    insta::assert_snapshot!("app_pom_on_feature_branch", app);
}

#[test]
fn git_properties_are_added_to_models_only() {
    let project = TestProject::new("");

    let mut session = Session::start(&project.context(&[]), &project.root_pom()).unwrap();
    let processed = session.process(&project.root_pom()).unwrap();

    let base = &processed.model.base;
    assert_eq!(base.property("git.branch"), Some("main"));
    assert_eq!(base.property("git.ref"), Some("main"));
    assert_eq!(base.property("git.dirty"), Some("false"));
    assert_eq!(base.property("git.commit.timestamp"), Some("1700000000"));
    assert!(!project.read(VERSIONED_POM_FILE_NAME).contains("git.branch"));
}

#[test]
fn applying_twice_is_byte_identical() {
    let project = TestProject::new("");

    let first = project.apply(&[]);
    let first_app = fs::read_to_string(project.derived("app")).unwrap();
    let second = project.apply(&[]);
    let second_app = fs::read_to_string(project.derived("app")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_app, second_app);
}

#[test]
fn each_module_is_versioned_once_per_session() {
    let project = TestProject::new("");

    let mut session = Session::start(&project.context(&[]), &project.root_pom()).unwrap();
    session.process_all(&project.root_pom()).unwrap();
    let again = session.process(&project.path().join("core/pom.xml")).unwrap();

    assert_eq!(again.status, ProcessStatus::Cached);
    assert_eq!(
        again.model.coordinate().version.as_deref(),
        Some("main-SNAPSHOT")
    );
}

#[test]
fn descriptor_outside_the_build_is_passed_through() {
    let project = TestProject::new("");
    project.write("tools/pom.xml", CORE_POM);

    let mut session = Session::start(&project.context(&[]), &project.root_pom()).unwrap();
    let processed = session
        .process(&project.path().join("tools/pom.xml"))
        .unwrap();

    assert_eq!(
        processed.status,
        ProcessStatus::Skipped(SkipReason::NotAModule)
    );
    assert!(!project.derived("tools").exists());
}

// =============================================================================
// Version Resolution
// =============================================================================

#[test]
fn detached_head_uses_highest_tag() {
    let project = TestProject::new("[[tag]]\n");
    project.git(&["tag", "1.2.0"]);
    project.git(&["tag", "1.10.0"]);
    project.git(&["checkout", "-q", "--detach"]);

    let root = project.apply(&[]);

    assert!(root.contains("<version>1.10.0</version>"));
}

#[test]
fn tag_rule_capture_group_feeds_version() {
    let project = TestProject::new(
        r#"
[[tag]]
pattern = "v(?<number>.*)"
version_format = "${number}"
"#,
    );
    project.git(&["tag", "v2.0.0"]);
    project.git(&["checkout", "-q", "--detach"]);

    let root = project.apply(&[]);

    assert!(root.contains("<artifactId>shop</artifactId>\n    <version>2.0.0</version>"));
}

#[test]
fn tag_override_detaches_head() {
    let project = TestProject::new(
        r#"
[[tag]]
pattern = "v(?<number>.*)"
version_format = "${number}"
"#,
    );

    let root = project.apply(&[(OPTION_GIT_TAG, "v3.1.0")]);

    assert!(root.contains("<version>3.1.0</version>"));
}

#[test]
fn empty_tag_override_falls_back_to_commit() {
    let project = TestProject::new("");
    let head = Session::resolve(&project.context(&[])).unwrap();
    let Session::Active(active) = head else {
        panic!("session should be active");
    };
    let commit = active.situation().head_commit.to_string();

    let root = project.apply(&[(OPTION_GIT_TAG, "")]);

    assert!(root.contains(&format!("<version>{}</version>", commit)));
}

#[test]
fn branch_override_replaces_branch_name() {
    let project = TestProject::new("");

    let root = project.apply(&[(OPTION_GIT_BRANCH, "release/2.x")]);

    assert!(root.contains("<version>release-2.x-SNAPSHOT</version>"));
}

#[test]
fn build_parameters_fill_placeholders_without_shadowing() {
    let project = TestProject::new(
        r#"
[[branch]]
version_format = "${branch}.${buildNumber}"
"#,
    );

    let root = project.apply(&[("buildNumber", "42"), ("branch", "other")]);

    assert!(root.contains("<version>main.42</version>"));
}

#[test]
fn untracked_file_marks_version_dirty() {
    let project = TestProject::new(
        r#"
[[branch]]
version_format = "${branch}${dirty.snapshot}"
"#,
    );

    assert!(project.apply(&[]).contains("<version>main</version>"));

    project.write("notes.txt", "scratch\n");
    assert!(project.apply(&[]).contains("<version>main-SNAPSHOT</version>"));
}

#[test]
fn property_rule_rewrites_property() {
    let project = TestProject::new(
        r#"
[[branch]]
pattern = "main"

[[branch.property]]
name = "shop.label"
value_format = "${value}-${branch}"
"#,
    );
    project.write(
        "pom.xml",
        &ROOT_POM.replace(
            "<packaging>pom</packaging>",
            "<packaging>pom</packaging>\n\n    <properties>\n        <shop.label>demo</shop.label>\n    </properties>",
        ),
    );
    project.commit_all("Add property");

    let root = project.apply(&[]);

    assert!(root.contains("<shop.label>demo-main</shop.label>"));
    assert!(root.contains("<version>main-SNAPSHOT</version>"));
}

#[test]
fn update_pom_replaces_original() {
    let project = TestProject::new("update_pom = true\n");

    let derived = project.apply(&[]);

    assert_eq!(project.read("pom.xml"), derived);
    assert!(project.read("core/pom.xml").contains("main-SNAPSHOT"));
}

// =============================================================================
// Disabled Sessions
// =============================================================================

#[test]
fn disable_parameter_writes_nothing() {
    let project = TestProject::new("");

    let mut session =
        Session::start(&project.context(&[(OPTION_DISABLE, "true")]), &project.root_pom())
            .unwrap();
    let results = session.process_all(&project.root_pom()).unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|processed| processed.status
        == ProcessStatus::Skipped(SkipReason::Disabled(DisabledReason::Option))));
    assert!(!project.derived("").exists());
    assert!(!project.derived("app").exists());
}

#[test]
fn disable_environment_variable_is_honored() {
    let project = TestProject::new("");
    let mut env = Params::new();
    env.insert(env_var_name(OPTION_DISABLE), "true".to_string());

    let ctx = Context::new(project.path(), Params::new(), env);
    let session = Session::resolve(&ctx).unwrap();

    assert!(matches!(
        session,
        Session::Disabled(DisabledReason::Option)
    ));
}

#[test]
fn disabled_by_config() {
    let project = TestProject::new("disable = true\n");

    let session = Session::resolve(&project.context(&[])).unwrap();

    assert!(matches!(session, Session::Disabled(DisabledReason::Config)));
}

#[test]
fn project_outside_repository_passes_through() {
    let project = TestProject::files_only("");

    let mut session = Session::start(&project.context(&[]), &project.root_pom()).unwrap();
    let results = session.process_all(&project.root_pom()).unwrap();

    assert!(session.is_disabled());
    assert_eq!(
        results[0].status,
        ProcessStatus::Skipped(SkipReason::Disabled(DisabledReason::NoRepository))
    );
    assert_eq!(
        results[0].model.coordinate().version.as_deref(),
        Some("1.0.0")
    );
    assert_eq!(project.read("pom.xml"), ROOT_POM);
    assert!(!project.derived("").exists());
}

#[test]
fn repository_without_commits_is_disabled() {
    let project = TestProject::files_only("");
    project.git(&["init", "-q", "-b", "main"]);

    let session = Session::resolve(&project.context(&[])).unwrap();

    assert!(matches!(
        session,
        Session::Disabled(DisabledReason::UnbornHead)
    ));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn missing_configuration_is_an_error() {
    let project = TestProject::new("");
    fs::remove_file(project.path().join(".mvn/git-versioning.toml")).unwrap();

    let err = Session::resolve(&project.context(&[])).unwrap_err();

    assert!(matches!(err, VersioningError::ConfigurationNotFound(_)));
}

#[test]
fn undefined_placeholder_aborts_without_writing() {
    let project = TestProject::new(
        r#"
[[branch]]
version_format = "${branch}-${nope}"
"#,
    );

    let mut session = Session::start(&project.context(&[]), &project.root_pom()).unwrap();
    let err = session.process_all(&project.root_pom()).unwrap_err();

    assert!(matches!(err, VersioningError::UndefinedPlaceholder(_)));
    assert!(!project.derived("").exists());
}
