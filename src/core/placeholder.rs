//! core::placeholder
//!
//! Placeholder context and `${name}` template rendering.
//!
//! # Layers
//!
//! The global context is built once per session from:
//! - commit id, short id and commit timestamp parts
//! - the resolved ref name, its type alias (`branch`, `tag`, `commit`) and slugs
//! - the dirty markers `dirty` and `dirty.snapshot`
//! - named capture groups of the matched rule pattern, only for keys not
//!   already defined
//! - build parameters, only for keys not already defined
//! - environment variables as `env.<NAME>`
//!
//! Per project, [`PlaceholderContext::for_version`] layers `version` and
//! `version.release` on top.
//!
//! # Example
//!
//! ```
//! use git_versioning::core::placeholder::{render, PlaceholderContext};
//!
//! let mut context = PlaceholderContext::new();
//! context.insert("branch", "main");
//! assert_eq!(render("${branch}-SNAPSHOT", &context).unwrap(), "main-SNAPSHOT");
//! assert!(render("${missing}", &context).is_err());
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use super::options::Params;
use super::resolve::ResolvedVersion;
use super::types::RefSituation;

/// Suffix of pre-release versions, stripped for `version.release`.
const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Errors from template rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("undefined placeholder '${{{name}}}' in '{template}'")]
    UndefinedPlaceholder { name: String, template: String },
}

/// Placeholder name to value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderContext {
    values: BTreeMap<String, String>,
}

impl PlaceholderContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Set a value only if the key is not defined yet.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of defined placeholders.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no placeholder is defined.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of this context with `version` and `version.release` bound to
    /// a project's original version.
    pub fn for_version(&self, original_version: &str) -> Self {
        let mut layered = self.clone();
        layered.insert("version", original_version);
        layered.insert("version.release", release_version(original_version));
        layered
    }

    /// Copy of this context with `value` bound.
    pub fn with_value(&self, value: &str) -> Self {
        let mut layered = self.clone();
        layered.insert("value", value);
        layered
    }

    /// Build the session-wide context.
    pub fn global(
        situation: &RefSituation,
        resolved: &ResolvedVersion,
        params: &Params,
        env: &Params,
    ) -> Self {
        let mut context = Self::new();

        let commit = situation.head_commit.as_str();
        context.insert("commit", commit);
        context.insert("commit.short", situation.head_commit.short(7));

        let timestamp = situation.head_commit_timestamp;
        let datetime = commit_datetime(timestamp);
        context.insert("commit.timestamp", timestamp.to_string());
        context.insert("commit.timestamp.year", datetime.format("%Y").to_string());
        context.insert("commit.timestamp.month", datetime.format("%m").to_string());
        context.insert("commit.timestamp.day", datetime.format("%d").to_string());
        context.insert("commit.timestamp.hour", datetime.format("%H").to_string());
        context.insert("commit.timestamp.minute", datetime.format("%M").to_string());
        context.insert("commit.timestamp.second", datetime.format("%S").to_string());
        context.insert(
            "commit.timestamp.datetime",
            if timestamp > 0 {
                datetime.format("%Y%m%d.%H%M%S").to_string()
            } else {
                "00000000.000000".to_string()
            },
        );

        let ref_type = resolved.ref_type.as_str();
        let ref_slug = slugify(&resolved.ref_name);
        context.insert("ref", resolved.ref_name.as_str());
        context.insert("ref.slug", ref_slug.as_str());
        context.insert(ref_type, resolved.ref_name.as_str());
        context.insert(format!("{}.slug", ref_type), ref_slug);

        let dirty = !situation.clean;
        context.insert("dirty", if dirty { "-DIRTY" } else { "" });
        context.insert("dirty.snapshot", if dirty { SNAPSHOT_SUFFIX } else { "" });

        // Capture groups never replace the keys above.
        for (name, value) in resolved.pattern_groups() {
            context.insert_if_absent(format!("{}.slug", name), slugify(&value));
            context.insert_if_absent(name, value);
        }

        for (key, value) in params {
            context.insert_if_absent(key.as_str(), value.as_str());
        }
        for (key, value) in env {
            context.insert_if_absent(format!("env.{}", key), value.as_str());
        }

        context
    }
}

fn commit_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Substitute every `${name}` in `template`.
///
/// `${}` and an unterminated `${` are kept literally.
///
/// # Errors
///
/// Returns [`PlaceholderError::UndefinedPlaceholder`] for the first name
/// without a value.
pub fn render(template: &str, context: &PlaceholderContext) -> Result<String, PlaceholderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };

        let name = &after[..end];
        if name.is_empty() {
            out.push_str(&rest[..start + 3]);
        } else {
            let value =
                context
                    .get(name)
                    .ok_or_else(|| PlaceholderError::UndefinedPlaceholder {
                        name: name.to_string(),
                        template: template.to_string(),
                    })?;
            out.push_str(&rest[..start]);
            out.push_str(value);
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Render a version template; `/` is replaced with `-` in the result.
pub fn render_version(
    template: &str,
    context: &PlaceholderContext,
) -> Result<String, PlaceholderError> {
    Ok(render(template, context)?.replace('/', "-"))
}

/// Lower-case a ref name and replace `/` with `-`.
///
/// # Example
///
/// ```
/// use git_versioning::core::placeholder::slugify;
///
/// assert_eq!(slugify("Feature/Login"), "feature-login");
/// ```
pub fn slugify(value: &str) -> String {
    value.replace('/', "-").to_lowercase()
}

/// Version with a trailing `-SNAPSHOT` removed.
pub fn release_version(version: &str) -> &str {
    version.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(version)
}

/// Metadata properties added to every processed project model.
pub fn git_properties(
    situation: &RefSituation,
    resolved: &ResolvedVersion,
) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let timestamp = situation.head_commit_timestamp;

    properties.insert("git.commit".to_string(), resolved.commit.to_string());
    properties.insert("git.commit.timestamp".to_string(), timestamp.to_string());
    properties.insert(
        "git.commit.timestamp.datetime".to_string(),
        if timestamp > 0 {
            commit_datetime(timestamp).to_rfc3339_opts(SecondsFormat::Secs, true)
        } else {
            "0000-00-00T00:00:00Z".to_string()
        },
    );

    let ref_type = resolved.ref_type.as_str();
    let ref_slug = slugify(&resolved.ref_name);
    properties.insert("git.ref".to_string(), resolved.ref_name.clone());
    properties.insert("git.ref.slug".to_string(), ref_slug.clone());
    properties.insert(format!("git.{}", ref_type), resolved.ref_name.clone());
    properties.insert(format!("git.{}.slug", ref_type), ref_slug);
    properties.insert("git.dirty".to_string(), (!situation.clean).to_string());

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{RulePattern, VersionRule};
    use crate::core::types::{Oid, RefType};
    use std::path::PathBuf;

    const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

    fn situation(timestamp: i64, clean: bool) -> RefSituation {
        RefSituation {
            head_commit: Oid::new(COMMIT).unwrap(),
            head_commit_timestamp: timestamp,
            branch: Some("Feature/Login".into()),
            tags: Vec::new(),
            clean,
            root_dir: PathBuf::from("/repo"),
        }
    }

    fn resolved(pattern: Option<&str>) -> ResolvedVersion {
        ResolvedVersion {
            ref_type: RefType::Branch,
            ref_name: "Feature/Login".into(),
            commit: Oid::new(COMMIT).unwrap(),
            rule: VersionRule {
                pattern: pattern.map(|p| RulePattern::new(p).unwrap()),
                ..VersionRule::default()
            },
        }
    }

    fn global(params: &[(&str, &str)], env: &[(&str, &str)]) -> PlaceholderContext {
        let to_params = |pairs: &[(&str, &str)]| -> Params {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        PlaceholderContext::global(
            &situation(1_700_000_000, true),
            &resolved(Some("(?<kind>[^/]+)/(?<name>.+)")),
            &to_params(params),
            &to_params(env),
        )
    }

    #[test]
    fn commit_keys() {
        let context = global(&[], &[]);
        assert_eq!(context.get("commit"), Some(COMMIT));
        assert_eq!(context.get("commit.short"), Some("0123456"));
    }

    #[test]
    fn timestamp_keys_are_padded() {
        // 2023-11-14T22:13:20Z
        let context = global(&[], &[]);
        assert_eq!(context.get("commit.timestamp"), Some("1700000000"));
        assert_eq!(context.get("commit.timestamp.year"), Some("2023"));
        assert_eq!(context.get("commit.timestamp.month"), Some("11"));
        assert_eq!(context.get("commit.timestamp.day"), Some("14"));
        assert_eq!(context.get("commit.timestamp.hour"), Some("22"));
        assert_eq!(context.get("commit.timestamp.minute"), Some("13"));
        assert_eq!(context.get("commit.timestamp.second"), Some("20"));
        assert_eq!(
            context.get("commit.timestamp.datetime"),
            Some("20231114.221320")
        );
    }

    #[test]
    fn zero_timestamp_uses_sentinel() {
        let context = PlaceholderContext::global(
            &situation(0, true),
            &resolved(None),
            &Params::new(),
            &Params::new(),
        );
        assert_eq!(
            context.get("commit.timestamp.datetime"),
            Some("00000000.000000")
        );
        assert_eq!(context.get("commit.timestamp.month"), Some("01"));
    }

    #[test]
    fn ref_keys_and_slugs() {
        let context = global(&[], &[]);
        assert_eq!(context.get("ref"), Some("Feature/Login"));
        assert_eq!(context.get("ref.slug"), Some("feature-login"));
        assert_eq!(context.get("branch"), Some("Feature/Login"));
        assert_eq!(context.get("branch.slug"), Some("feature-login"));
        assert_eq!(context.get("tag"), None);
    }

    #[test]
    fn capture_groups_and_slugs() {
        let context = global(&[], &[]);
        assert_eq!(context.get("kind"), Some("Feature"));
        assert_eq!(context.get("kind.slug"), Some("feature"));
        assert_eq!(context.get("name"), Some("Login"));
    }

    #[test]
    fn dirty_markers() {
        let clean = global(&[], &[]);
        assert_eq!(clean.get("dirty"), Some(""));
        assert_eq!(clean.get("dirty.snapshot"), Some(""));

        let dirty = PlaceholderContext::global(
            &situation(0, false),
            &resolved(None),
            &Params::new(),
            &Params::new(),
        );
        assert_eq!(dirty.get("dirty"), Some("-DIRTY"));
        assert_eq!(dirty.get("dirty.snapshot"), Some("-SNAPSHOT"));
    }

    #[test]
    fn capture_groups_do_not_shadow_ref_keys() {
        let context = PlaceholderContext::global(
            &situation(1_700_000_000, false),
            &resolved(Some("(?<ref>[^/]+)/(?<branch>L)(?<dirty>ogin)")),
            &Params::new(),
            &Params::new(),
        );
        assert_eq!(context.get("ref"), Some("Feature/Login"));
        assert_eq!(context.get("ref.slug"), Some("feature-login"));
        assert_eq!(context.get("branch"), Some("Feature/Login"));
        assert_eq!(context.get("branch.slug"), Some("feature-login"));
        assert_eq!(context.get("dirty"), Some("-DIRTY"));
    }

    #[test]
    fn params_do_not_shadow_capture_groups() {
        let context = global(&[("kind", "hijacked"), ("name.slug", "x")], &[]);
        assert_eq!(context.get("kind"), Some("Feature"));
        assert_eq!(context.get("name.slug"), Some("login"));
    }

    #[test]
    fn params_do_not_shadow_ref_keys() {
        let context = global(&[("branch", "hijacked"), ("build", "42")], &[]);
        assert_eq!(context.get("branch"), Some("Feature/Login"));
        assert_eq!(context.get("build"), Some("42"));
    }

    #[test]
    fn env_is_prefixed() {
        let context = global(&[], &[("BUILD_NUMBER", "7")]);
        assert_eq!(context.get("env.BUILD_NUMBER"), Some("7"));
        assert_eq!(context.get("BUILD_NUMBER"), None);
    }

    #[test]
    fn version_layer() {
        let context = global(&[], &[]).for_version("1.2.3-SNAPSHOT");
        assert_eq!(context.get("version"), Some("1.2.3-SNAPSHOT"));
        assert_eq!(context.get("version.release"), Some("1.2.3"));
    }

    #[test]
    fn render_substitutes_all() {
        let context = global(&[], &[]).for_version("1.0");
        let rendered = render("${version}-${branch.slug}${dirty}", &context).unwrap();
        assert_eq!(rendered, "1.0-feature-login");
    }

    #[test]
    fn render_without_placeholders_is_identity() {
        let context = PlaceholderContext::new();
        assert_eq!(render("plain-1.0", &context).unwrap(), "plain-1.0");
        assert_eq!(render("$notaplaceholder", &context).unwrap(), "$notaplaceholder");
        assert_eq!(render("${}-${open", &context).unwrap(), "${}-${open");
    }

    #[test]
    fn render_reports_undefined_name() {
        let context = PlaceholderContext::new();
        assert_eq!(
            render("a-${nope}", &context),
            Err(PlaceholderError::UndefinedPlaceholder {
                name: "nope".into(),
                template: "a-${nope}".into(),
            })
        );
    }

    #[test]
    fn render_version_replaces_slashes() {
        let mut context = PlaceholderContext::new();
        context.insert("branch", "feature/login");
        assert_eq!(
            render_version("${branch}-SNAPSHOT", &context).unwrap(),
            "feature-login-SNAPSHOT"
        );
    }

    #[test]
    fn git_properties_for_branch() {
        let properties = git_properties(&situation(1_700_000_000, false), &resolved(None));
        assert_eq!(properties["git.commit"], COMMIT);
        assert_eq!(properties["git.commit.timestamp"], "1700000000");
        assert_eq!(
            properties["git.commit.timestamp.datetime"],
            "2023-11-14T22:13:20Z"
        );
        assert_eq!(properties["git.ref"], "Feature/Login");
        assert_eq!(properties["git.ref.slug"], "feature-login");
        assert_eq!(properties["git.branch"], "Feature/Login");
        assert_eq!(properties["git.branch.slug"], "feature-login");
        assert_eq!(properties["git.dirty"], "true");
    }

    #[test]
    fn git_properties_zero_timestamp() {
        let properties = git_properties(&situation(0, true), &resolved(None));
        assert_eq!(
            properties["git.commit.timestamp.datetime"],
            "0000-00-00T00:00:00Z"
        );
        assert_eq!(properties["git.dirty"], "false");
    }
}
