//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! `.mvn/git-versioning.toml` in the execution root, i.e. the nearest
//! ancestor of the working directory that contains a `.mvn` directory.
//!
//! # Validation
//!
//! Rule patterns are compiled while the file is deserialized, so a loaded
//! [`Configuration`] never carries an invalid regular expression.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Versioning configuration (execution-root scope).
///
/// # Example
///
/// ```toml
/// prefer_tags = false
/// update_pom = false
///
/// [[branch]]
/// pattern = "feature/(?<feature>.+)"
/// version_format = "${feature.slug}-SNAPSHOT"
///
/// [[tag]]
/// pattern = "v(?<number>[0-9].*)"
/// version_format = "${number}"
///
/// [commit]
/// version_format = "${commit.short}"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// Disable versioning entirely
    pub disable: Option<bool>,

    /// Consider head tags even when a branch is checked out
    pub prefer_tags: Option<bool>,

    /// Copy the derived descriptor over the original
    pub update_pom: Option<bool>,

    /// Branch rules, first match wins
    pub branch: Vec<VersionRule>,

    /// Tag rules, first match wins
    pub tag: Vec<VersionRule>,

    /// Rule for a detached HEAD without a matching tag
    pub commit: Option<VersionRule>,
}

impl Configuration {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rules = self
            .branch
            .iter()
            .map(|rule| ("branch", rule))
            .chain(self.tag.iter().map(|rule| ("tag", rule)))
            .chain(self.commit.iter().map(|rule| ("commit", rule)));

        for (group, rule) in rules {
            if let Some(format) = &rule.version_format {
                if format.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} rule has an empty version_format",
                        group
                    )));
                }
            }
            for property in &rule.property {
                if property.name.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} rule has a property rule without a name",
                        group
                    )));
                }
            }
        }

        Ok(())
    }
}

/// One entry of a rule list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VersionRule {
    /// Pattern the ref name must match entirely; `None` matches anything
    pub pattern: Option<RulePattern>,

    /// Version template; the rule group's default when absent
    pub version_format: Option<String>,

    /// Overrides the global `update_pom` when this rule matched
    pub update_pom: Option<bool>,

    /// Property rewrites applied when this rule matched
    pub property: Vec<PropertyRule>,
}

impl VersionRule {
    /// Check whether `name` satisfies this rule.
    pub fn matches(&self, name: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(name))
    }
}

/// Rewrite rule for a single project property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PropertyRule {
    /// Property element name, e.g. `my.version`
    pub name: String,

    /// Value template; `${value}` is the property's current value
    pub value_format: String,
}

/// A compiled rule pattern.
///
/// Patterns always match the whole ref name: `feature/.*` matches
/// `feature/login` but not `x/feature/login`.
///
/// # Example
///
/// ```
/// use git_versioning::core::config::schema::RulePattern;
///
/// let pattern = RulePattern::new("feature/.*").unwrap();
/// assert!(pattern.is_match("feature/login"));
/// assert!(!pattern.is_match("x/feature/login"));
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RulePattern {
    source: String,
    regex: Regex,
}

impl RulePattern {
    /// Compile a pattern, anchoring it at both ends.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the pattern is not a valid regex.
    pub fn new(source: impl Into<String>) -> Result<Self, ConfigError> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|e| {
            ConfigError::InvalidValue(format!("invalid pattern '{}': {}", source, e))
        })?;
        Ok(Self { source, regex })
    }

    /// Whole-string match.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Values of all named capture groups that participated in the match.
    pub fn named_groups(&self, value: &str) -> Vec<(String, String)> {
        let Some(captures) = self.regex.captures(value) else {
            return Vec::new();
        };

        self.regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect()
    }

    /// The pattern as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for RulePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RulePattern").field(&self.source).finish()
    }
}

impl TryFrom<String> for RulePattern {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RulePattern> for String {
    fn from(pattern: RulePattern) -> Self {
        pattern.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_parses() {
        let config: Configuration = toml::from_str("").unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn full_config_parses_in_order() {
        let toml = r#"
            prefer_tags = true
            update_pom = false

            [[branch]]
            pattern = "main"
            version_format = "${version}"

            [[branch]]
            pattern = "feature/(?<feature>.+)"
            version_format = "${feature}-SNAPSHOT"
            update_pom = true

            [[branch.property]]
            name = "my.version"
            value_format = "${value}-${commit.short}"

            [[tag]]
            pattern = "v(?<number>.*)"

            [commit]
            version_format = "${commit.short}"
        "#;

        let config: Configuration = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.prefer_tags, Some(true));
        assert_eq!(config.branch.len(), 2);
        assert_eq!(config.branch[0].pattern.as_ref().unwrap().as_str(), "main");
        assert_eq!(config.branch[1].update_pom, Some(true));
        assert_eq!(config.branch[1].property[0].name, "my.version");
        assert_eq!(config.tag[0].version_format, None);
        assert!(config.commit.is_some());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<Configuration, _> = toml::from_str("unknown = 1");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_pattern_rejected_at_parse_time() {
        let result: Result<Configuration, _> = toml::from_str("[[branch]]\npattern = \"(\"");
        assert!(result.is_err());
    }

    #[test]
    fn empty_version_format_rejected() {
        let config: Configuration =
            toml::from_str("[[tag]]\nversion_format = \"  \"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn pattern_is_anchored() {
        let pattern = RulePattern::new("feature/.*").unwrap();
        assert!(pattern.is_match("feature/login"));
        assert!(!pattern.is_match("my-feature/login"));

        let pattern = RulePattern::new("main|master").unwrap();
        assert!(pattern.is_match("master"));
        assert!(!pattern.is_match("main2"));
    }

    #[test]
    fn rule_without_pattern_matches_anything() {
        assert!(VersionRule::default().matches("anything/at-all"));
    }

    #[test]
    fn named_groups_extracted() {
        let pattern = RulePattern::new("(?<kind>feature|fix)/(?<name>.+)").unwrap();
        let groups = pattern.named_groups("feature/Login");
        assert_eq!(
            groups,
            vec![
                ("kind".to_string(), "feature".to_string()),
                ("name".to_string(), "Login".to_string())
            ]
        );
        assert!(pattern.named_groups("other").is_empty());
    }
}
