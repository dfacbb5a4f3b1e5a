//! core::options
//!
//! Runtime options and their precedence.
//!
//! Each option is looked up, in order:
//! 1. Build parameters (`-D versioning.preferTags=true` or the matching CLI flag)
//! 2. Environment variables (`VERSIONING_PREFER_TAGS=true`)
//! 3. The configuration file
//!
//! Environment variable names are derived from the option name: a leading
//! `versioning.` is dropped, camel-case words and dots become underscores,
//! and the result is upper-cased and prefixed with `VERSIONING_`.

use std::collections::BTreeMap;

use super::config::{Configuration, VersionRule};

/// Option key: disable versioning.
pub const OPTION_DISABLE: &str = "versioning.disable";
/// Option key: consider tags even when on a branch.
pub const OPTION_PREFER_TAGS: &str = "versioning.preferTags";
/// Option key: copy the derived descriptor over the original.
pub const OPTION_UPDATE_POM: &str = "versioning.updatePom";
/// Option key: force a single head tag.
pub const OPTION_GIT_TAG: &str = "git.tag";
/// Option key: force the branch name.
pub const OPTION_GIT_BRANCH: &str = "git.branch";

/// Key/value pairs supplied as build parameters or environment variables.
pub type Params = BTreeMap<String, String>;

/// Options given for one invocation, before the configuration is consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub disable: Option<bool>,
    pub prefer_tags: Option<bool>,
    pub update_pom: Option<bool>,
    pub git_tag: Option<String>,
    pub git_branch: Option<String>,
}

impl RuntimeOptions {
    /// Resolve every option from build parameters, then the environment.
    pub fn resolve(params: &Params, env: &Params) -> Self {
        let lookup = |name: &str| option_value(name, params, env);
        Self {
            disable: lookup(OPTION_DISABLE).map(|v| parse_bool(&v)),
            prefer_tags: lookup(OPTION_PREFER_TAGS).map(|v| parse_bool(&v)),
            update_pom: lookup(OPTION_UPDATE_POM).map(|v| parse_bool(&v)),
            git_tag: lookup(OPTION_GIT_TAG),
            git_branch: lookup(OPTION_GIT_BRANCH),
        }
    }

    /// Whether versioning is disabled for this session.
    pub fn disabled(&self, config: &Configuration) -> bool {
        self.disable.or(config.disable).unwrap_or(false)
    }

    /// Whether tags take precedence over the current branch.
    pub fn prefer_tags(&self, config: &Configuration) -> bool {
        self.prefer_tags.or(config.prefer_tags).unwrap_or(false)
    }

    /// Whether the original descriptor gets replaced by the derived one.
    ///
    /// The matched rule's own setting sits between the option and the
    /// global configuration value.
    pub fn update_pom(&self, config: &Configuration, rule: &VersionRule) -> bool {
        self.update_pom
            .or(rule.update_pom)
            .or(config.update_pom)
            .unwrap_or(false)
    }
}

/// Look up a single option by name.
pub fn option_value(name: &str, params: &Params, env: &Params) -> Option<String> {
    params
        .get(name)
        .or_else(|| env.get(&env_var_name(name)))
        .cloned()
}

/// Environment variable carrying the option `name`.
///
/// # Example
///
/// ```
/// use git_versioning::core::options::env_var_name;
///
/// assert_eq!(env_var_name("versioning.preferTags"), "VERSIONING_PREFER_TAGS");
/// assert_eq!(env_var_name("git.tag"), "VERSIONING_GIT_TAG");
/// ```
pub fn env_var_name(name: &str) -> String {
    let plain = name.strip_prefix("versioning.").unwrap_or(name);
    let mut out = String::from("VERSIONING_");
    for (i, c) in plain.chars().enumerate() {
        if c == '.' {
            out.push('_');
        } else if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_uppercase());
        }
    }
    out
}

/// `true` (case-insensitive) is true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
