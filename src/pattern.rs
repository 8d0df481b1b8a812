//! Ordered glob pattern groups and the path globber.
//!
//! A [`PatternGroup`] is an ordered list of glob patterns. Evaluating a group
//! against a source root returns the matches of the first pattern that
//! matches anything; the remaining patterns of the group are not evaluated.
//! This lets a group say "prefer the flat convention, fall back to the nested
//! one" without any branching in the caller.
//!
//! Patterns use the `glob` crate syntax (`*`, `?`, `**`, `[...]`, `[!...]`)
//! extended with `{a,b}` alternation, which is expanded before matching.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ordered group of glob patterns evaluated with first-match-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternGroup(Vec<String>);

impl PatternGroup {
    /// Create a group from patterns in priority order.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    /// The patterns of this group, in priority order.
    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    /// Whether the group has no patterns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compile every pattern of the group without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.0 {
            for expanded in expand_braces(pattern) {
                compile(&expanded)?;
            }
        }
        Ok(())
    }
}

/// Expand `{a,b}` alternations into every concrete pattern.
///
/// Nested groups are expanded recursively and the expansion order follows the
/// order of the alternatives. A group without a comma is kept literally.
///
/// ```
/// use assetwire::pattern::expand_braces;
///
/// assert_eq!(
///     expand_braces("scripts/*.{js,ts}"),
///     vec!["scripts/*.js", "scripts/*.ts"]
/// );
/// ```
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = find_brace_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let body = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];

    let alternatives = split_alternatives(body);
    if alternatives.len() < 2 {
        // Literal braces: keep them and continue with the remainder.
        return expand_braces(suffix)
            .into_iter()
            .map(|rest| format!("{}{{{}}}{}", prefix, body, rest))
            .collect();
    }

    alternatives
        .iter()
        .flat_map(|alt| expand_braces(&format!("{}{}{}", prefix, alt, suffix)))
        .collect()
}

/// Locate the first top-level `{...}` group.
fn find_brace_group(pattern: &str) -> Option<(usize, usize)> {
    let open = pattern.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in pattern[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open, open + offset));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a brace body on commas that are not nested in another group.
fn split_alternatives(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

/// Evaluate one pattern (already brace-free) relative to `root`.
fn glob_one(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    // Validate the relative pattern first so error messages name what the
    // user wrote rather than the absolute form.
    compile(pattern)?;

    let absolute = format!(
        "{}/{}",
        Pattern::escape(&root.to_string_lossy()),
        pattern.trim_start_matches("./")
    );

    let paths = glob::glob_with(&absolute, match_options()).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable path while globbing '{}': {}", pattern, e),
        }
    }
    Ok(files)
}

/// Resolve a pattern group against `root`.
///
/// Returns the absolute, sorted matches of the first pattern (after brace
/// expansion) that matches at least one regular file. Patterns after the
/// first match are never evaluated. No match is not an error.
pub fn glob_files(root: impl AsRef<Path>, group: &PatternGroup) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();

    for pattern in group.patterns() {
        let mut files = Vec::new();
        for expanded in expand_braces(pattern) {
            files.extend(glob_one(root, &expanded)?);
        }

        if !files.is_empty() {
            files.sort();
            files.dedup();
            debug!("Pattern '{}' matched {} file(s)", pattern, files.len());
            return Ok(files);
        }
    }

    Ok(Vec::new())
}
