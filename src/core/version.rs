//! core::version
//!
//! Numeric-aware version ordering for tag names.
//!
//! Tags are ordered the way Maven orders artifact versions, not lexically:
//! `1.10.0` sorts after `1.2.0`, `1.0-SNAPSHOT` sorts before `1.0`, and
//! `1.0-rc1` sorts before `1.0`.
//!
//! # Algorithm
//!
//! A version is split into items at `.` and `-` separators and at every
//! transition between digits and letters. Numeric items compare numerically,
//! qualifiers compare by a fixed rank (`alpha < beta < milestone < rc <
//! snapshot < release < sp`) and unknown qualifiers sort after the known ones,
//! lexically. A missing item compares like `0` / an empty qualifier, so `1.0`
//! and `1` are equivalent.
//!
//! # Example
//!
//! ```
//! use git_versioning::core::version::compare_versions;
//! use std::cmp::Ordering;
//!
//! assert_eq!(compare_versions("1.10.0", "1.2.0"), Ordering::Greater);
//! assert_eq!(compare_versions("1.0-SNAPSHOT", "1.0"), Ordering::Less);
//! ```

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    /// Digits with leading zeros stripped
    Number(String),
    Qualifier(String),
}

impl Item {
    fn number(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Item::Number(trimmed.to_string())
    }

    fn qualifier(raw: &str, followed_by_digit: bool) -> Self {
        let lower = raw.to_ascii_lowercase();
        let expanded = match lower.as_str() {
            "a" if followed_by_digit => "alpha",
            "b" if followed_by_digit => "beta",
            "m" if followed_by_digit => "milestone",
            _ => lower.as_str(),
        };
        Item::Qualifier(expanded.to_string())
    }
}

/// Rank of well-known qualifiers; `None` for unknown ones.
fn qualifier_rank(qualifier: &str) -> Option<u8> {
    match qualifier {
        "alpha" => Some(0),
        "beta" => Some(1),
        "milestone" => Some(2),
        "rc" | "cr" => Some(3),
        "snapshot" => Some(4),
        "" | "ga" | "final" | "release" => Some(5),
        "sp" => Some(6),
        _ => None,
    }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    match (qualifier_rank(a), qualifier_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (Some(Item::Number(x)), Some(Item::Number(y))) => compare_numbers(x, y),
        (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => compare_qualifiers(x, y),
        (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::Number(x)), None) => compare_numbers(x, ""),
        (None, Some(Item::Number(y))) => compare_numbers("", y),
        (Some(Item::Qualifier(x)), None) => compare_qualifiers(x, ""),
        (None, Some(Item::Qualifier(y))) => compare_qualifiers("", y),
        (None, None) => Ordering::Equal,
    }
}

fn parse_items(version: &str) -> Vec<Item> {
    let chars: Vec<char> = version.chars().collect();
    let mut items = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let c = chars[start];
        if c == '.' || c == '-' || c == '_' || c == '+' {
            start += 1;
            continue;
        }

        let digit = c.is_ascii_digit();
        let mut end = start;
        while end < chars.len()
            && chars[end].is_ascii_digit() == digit
            && !matches!(chars[end], '.' | '-' | '_' | '+')
        {
            end += 1;
        }

        let token: String = chars[start..end].iter().collect();
        if digit {
            items.push(Item::number(&token));
        } else {
            let followed_by_digit = chars.get(end).is_some_and(char::is_ascii_digit);
            items.push(Item::qualifier(&token, followed_by_digit));
        }
        start = end;
    }

    items
}

/// Compare two version strings.
///
/// Versions that are equivalent under the item ordering (such as `1.0` and
/// `1`) fall back to a plain string comparison so that sorting is total and
/// deterministic.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = parse_items(a);
    let right = parse_items(b);
    let len = left.len().max(right.len());

    (0..len)
        .map(|i| compare_items(left.get(i), right.get(i)))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or_else(|| a.cmp(b))
}

/// Sort versions from highest to lowest.
pub fn sort_descending(versions: &[String]) -> Vec<&str> {
    let mut sorted: Vec<&str> = versions.iter().map(String::as_str).collect();
    sorted.sort_by(|a, b| compare_versions(b, a));
    sorted
}
