//! core::resolve
//!
//! Chooses the ref that identifies the current build.
//!
//! # Precedence
//!
//! 1. Detached HEAD or `prefer_tags`: tag rules in configured order, each
//!    tried against the head tags from the highest version to the lowest.
//! 2. Detached HEAD without a matching tag: the commit rule if its pattern
//!    matches the commit id, else the built-in commit default.
//! 3. Attached HEAD: branch rules in configured order, else the built-in
//!    branch default.
//!
//! Resolution cannot fail: every path ends in a built-in default.

use serde::Serialize;

use super::config::{Configuration, VersionRule};
use super::types::{Oid, RefSituation, RefType};
use super::version::sort_descending;

/// The ref chosen for a session, with the rule that matched it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedVersion {
    /// Which kind of ref matched
    pub ref_type: RefType,
    /// Branch name, tag name or commit id
    pub ref_name: String,
    /// Head commit
    pub commit: Oid,
    /// The matched rule; a rule without pattern or format for built-in defaults
    #[serde(skip)]
    pub rule: VersionRule,
}

impl ResolvedVersion {
    fn new(ref_type: RefType, ref_name: &str, commit: &Oid, rule: VersionRule) -> Self {
        Self {
            ref_type,
            ref_name: ref_name.to_string(),
            commit: commit.clone(),
            rule,
        }
    }

    /// Version template to render, falling back to the ref type's default.
    pub fn version_format(&self) -> &str {
        self.rule
            .version_format
            .as_deref()
            .unwrap_or_else(|| self.ref_type.default_version_format())
    }

    /// Named capture groups of the matched rule applied to the ref name.
    pub fn pattern_groups(&self) -> Vec<(String, String)> {
        self.rule
            .pattern
            .as_ref()
            .map(|pattern| pattern.named_groups(&self.ref_name))
            .unwrap_or_default()
    }
}

/// Resolve the version identity for a session.
///
/// # Example
///
/// ```
/// use git_versioning::core::config::Configuration;
/// use git_versioning::core::resolve::resolve;
/// use git_versioning::core::types::{Oid, RefSituation, RefType};
/// use std::path::PathBuf;
///
/// let situation = RefSituation {
///     head_commit: Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap(),
///     head_commit_timestamp: 0,
///     branch: None,
///     tags: vec!["1.2.0".into(), "1.10.0".into()],
///     clean: true,
///     root_dir: PathBuf::from("/repo"),
/// };
/// let config: Configuration = toml::from_str("[[tag]]").unwrap();
///
/// let resolved = resolve(&situation, &config, false);
/// assert_eq!(resolved.ref_type, RefType::Tag);
/// assert_eq!(resolved.ref_name, "1.10.0");
/// ```
pub fn resolve(
    situation: &RefSituation,
    config: &Configuration,
    prefer_tags: bool,
) -> ResolvedVersion {
    let commit = &situation.head_commit;

    if situation.is_detached() || prefer_tags {
        if let Some((tag, rule)) = match_tag(&situation.tags, &config.tag) {
            return ResolvedVersion::new(RefType::Tag, tag, commit, rule.clone());
        }
    }

    match situation.branch.as_deref() {
        None => {
            let rule = config
                .commit
                .as_ref()
                .filter(|rule| rule.matches(commit.as_str()))
                .cloned()
                .unwrap_or_default();
            ResolvedVersion::new(RefType::Commit, commit.as_str(), commit, rule)
        }
        Some(branch) => {
            let rule = first_match(&config.branch, branch)
                .cloned()
                .unwrap_or_default();
            ResolvedVersion::new(RefType::Branch, branch, commit, rule)
        }
    }
}

fn first_match<'a>(rules: &'a [VersionRule], name: &str) -> Option<&'a VersionRule> {
    rules.iter().find(|rule| rule.matches(name))
}

/// First rule (in order) that matches any tag, with its highest matching tag.
fn match_tag<'a, 'r>(
    tags: &'a [String],
    rules: &'r [VersionRule],
) -> Option<(&'a str, &'r VersionRule)> {
    let sorted = sort_descending(tags);
    rules.iter().find_map(|rule| {
        sorted
            .iter()
            .find(|tag| rule.matches(tag))
            .map(|tag| (*tag, rule))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RulePattern;
    use std::path::PathBuf;

    const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

    fn situation(branch: Option<&str>, tags: &[&str]) -> RefSituation {
        RefSituation {
            head_commit: Oid::new(COMMIT).unwrap(),
            head_commit_timestamp: 0,
            branch: branch.map(String::from),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            clean: true,
            root_dir: PathBuf::from("/repo"),
        }
    }

    fn rule(pattern: Option<&str>, format: &str) -> VersionRule {
        VersionRule {
            pattern: pattern.map(|p| RulePattern::new(p).unwrap()),
            version_format: Some(format.to_string()),
            ..VersionRule::default()
        }
    }

    #[test]
    fn branch_rule_matches_in_order() {
        let config = Configuration {
            branch: vec![
                rule(Some("main"), "${version}"),
                rule(Some("feature/.*"), "${branch}-SNAPSHOT"),
                rule(None, "catch-all"),
            ],
            ..Configuration::default()
        };

        let resolved = resolve(&situation(Some("feature/login"), &[]), &config, false);
        assert_eq!(resolved.ref_type, RefType::Branch);
        assert_eq!(resolved.ref_name, "feature/login");
        assert_eq!(resolved.version_format(), "${branch}-SNAPSHOT");

        let resolved = resolve(&situation(Some("develop"), &[]), &config, false);
        assert_eq!(resolved.version_format(), "catch-all");
    }

    #[test]
    fn branch_default_when_nothing_matches() {
        let config = Configuration {
            branch: vec![rule(Some("main"), "${version}")],
            ..Configuration::default()
        };
        let resolved = resolve(&situation(Some("main-2"), &[]), &config, false);
        assert_eq!(resolved.ref_type, RefType::Branch);
        assert_eq!(resolved.version_format(), "${branch}-SNAPSHOT");
        assert_eq!(resolved.rule, VersionRule::default());
    }

    #[test]
    fn attached_branch_ignores_tags_without_preference() {
        let config = Configuration {
            tag: vec![rule(None, "${tag}")],
            ..Configuration::default()
        };
        let resolved = resolve(&situation(Some("main"), &["1.0.0"]), &config, false);
        assert_eq!(resolved.ref_type, RefType::Branch);
    }

    #[test]
    fn prefer_tags_on_branch() {
        let config = Configuration {
            tag: vec![rule(None, "${tag}")],
            ..Configuration::default()
        };
        let resolved = resolve(&situation(Some("main"), &["1.0.0"]), &config, true);
        assert_eq!(resolved.ref_type, RefType::Tag);
        assert_eq!(resolved.ref_name, "1.0.0");
    }

    #[test]
    fn detached_picks_highest_version_tag() {
        let config = Configuration {
            tag: vec![rule(None, "${tag}")],
            ..Configuration::default()
        };
        let resolved = resolve(&situation(None, &["1.2.0", "1.10.0"]), &config, false);
        assert_eq!(resolved.ref_type, RefType::Tag);
        assert_eq!(resolved.ref_name, "1.10.0");
    }

    #[test]
    fn first_matching_tag_rule_wins_over_higher_tag() {
        let config = Configuration {
            tag: vec![
                rule(Some("v(?<n>.*)"), "${n}"),
                rule(None, "${tag}"),
            ],
            ..Configuration::default()
        };
        let resolved = resolve(&situation(None, &["v1.0", "9.0"]), &config, false);
        assert_eq!(resolved.ref_name, "v1.0");
        assert_eq!(
            resolved.pattern_groups(),
            vec![("n".to_string(), "1.0".to_string())]
        );
    }

    #[test]
    fn detached_without_tags_falls_through_to_commit() {
        let config = Configuration {
            tag: vec![rule(None, "${tag}")],
            commit: Some(rule(None, "${commit.short}")),
            ..Configuration::default()
        };
        let resolved = resolve(&situation(None, &[]), &config, false);
        assert_eq!(resolved.ref_type, RefType::Commit);
        assert_eq!(resolved.ref_name, COMMIT);
        assert_eq!(resolved.version_format(), "${commit.short}");
    }

    #[test]
    fn commit_rule_pattern_must_match() {
        let config = Configuration {
            commit: Some(rule(Some("ffff.*"), "nope")),
            ..Configuration::default()
        };
        let resolved = resolve(&situation(None, &[]), &config, false);
        assert_eq!(resolved.ref_type, RefType::Commit);
        assert_eq!(resolved.version_format(), "${commit}");
    }

    #[test]
    fn unmatched_tags_fall_through_to_commit() {
        let config = Configuration {
            tag: vec![rule(Some("v.*"), "${tag}")],
            ..Configuration::default()
        };
        let resolved = resolve(&situation(None, &["release-1"]), &config, false);
        assert_eq!(resolved.ref_type, RefType::Commit);
    }

    #[test]
    fn prefer_tags_without_match_stays_on_branch() {
        let config = Configuration::default();
        let resolved = resolve(&situation(Some("main"), &["1.0"]), &config, true);
        assert_eq!(resolved.ref_type, RefType::Branch);
    }
}
