//! Entry discovery and entry-name derivation.
//!
//! Every discovered source file becomes one bundler entry. Its name is built
//! from the directory conventions of the source tree:
//!
//! - the first path segment is the category (`scripts`, `styles`, `client`,
//!   `packages`, ...);
//! - the remaining directories and the file stem form a hyphen-joined tail;
//! - redundant segments are collapsed so that repeating a directory name in
//!   the file name does not repeat it in the entry name.
//!
//! | Source file                          | Entry name               |
//! |--------------------------------------|--------------------------|
//! | `scripts/foo.js`                     | `scripts/foo`            |
//! | `scripts/admin/admin-settings.js`    | `scripts/admin-settings` |
//! | `scripts/blocks/blocks-editor.js`    | `scripts/blocks-editor`  |
//! | `client/widget/index.js`             | `client/widget`          |
//! | `client/admin/settings/index.js`     | `client/admin-settings`  |

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::defaults::RESERVED_PREFIXES;
use crate::error::{Error, Result};
use crate::pattern::{PatternGroup, glob_files};

/// What to do when two files produce the same entry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// The file discovered last replaces the earlier one; a warning is logged.
    #[default]
    LastWriteWins,
    /// Fail with [`Error::EntryCollision`].
    Strict,
}

/// Entry name to absolute source file, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntryMap(BTreeMap<String, PathBuf>);

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry according to `policy`.
    pub fn insert(&mut self, name: String, file: PathBuf, policy: CollisionPolicy) -> Result<()> {
        match self.0.get(&name) {
            Some(existing) if existing != &file => match policy {
                CollisionPolicy::Strict => {
                    return Err(Error::EntryCollision {
                        name,
                        first: existing.clone(),
                        second: file,
                    });
                }
                CollisionPolicy::LastWriteWins => {
                    warn!(
                        "Entry '{}' from {} replaces {}",
                        name,
                        file.display(),
                        existing.display()
                    );
                }
            },
            _ => {}
        }
        self.0.insert(name, file);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.0.iter()
    }
}

/// Split the path of `file` relative to `root` into its normal segments.
fn relative_segments(root: &Path, file: &Path) -> Option<Vec<String>> {
    let relative = file.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    Some(segments)
}

fn file_stem(segment: &str) -> &str {
    Path::new(segment)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(segment)
}

fn is_reserved(stem: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| stem.starts_with(prefix))
}

/// Drop tail segments contained in another, different tail segment.
fn collapse_overlapping(tail: Vec<String>) -> Vec<String> {
    tail.iter()
        .enumerate()
        .filter(|(index, part)| {
            !tail.iter().enumerate().any(|(other_index, other)| {
                other_index != *index && other != *part && other.contains(part.as_str())
            })
        })
        .map(|(_, part)| part.clone())
        .collect()
}

/// Hyphen-join segments and collapse adjacent repeated tokens.
fn join_tail(tail: &[String]) -> String {
    let mut tokens: Vec<&str> = Vec::new();
    for token in tail.iter().flat_map(|part| part.split('-')) {
        if token.is_empty() || tokens.last() == Some(&token) {
            continue;
        }
        tokens.push(token);
    }
    tokens.join("-")
}

/// Derive the entry name of `file` discovered under `root`.
///
/// Returns `None` when the file is not inside `root` or sits directly in it
/// (no category directory).
pub fn entry_name(root: impl AsRef<Path>, file: impl AsRef<Path>) -> Option<String> {
    let mut segments = relative_segments(root.as_ref(), file.as_ref())?;
    if segments.len() < 2 {
        return None;
    }

    let category = segments.remove(0);
    let file_segment = segments.pop()?;
    let mut stem = file_stem(&file_segment).to_string();
    let directories = segments;

    if let Some(parent) = directories.last()
        && !is_reserved(&stem)
        && let Some(rest) = stem.strip_prefix(&format!("{}-", parent))
        && !rest.is_empty()
    {
        stem = rest.to_string();
    }

    let mut tail = directories;
    if stem != "index" || tail.is_empty() {
        tail.push(stem);
    }

    let tail = collapse_overlapping(tail);
    let joined = join_tail(&tail);
    if joined.is_empty() {
        return None;
    }

    Some(format!("{}/{}", category, joined))
}

/// Discover asset entries for every pattern group under `source`.
///
/// Groups are evaluated in order; each contributes the files of its first
/// matching pattern. Files whose name cannot be derived are skipped.
pub fn discover_assets(
    source: impl AsRef<Path>,
    groups: &[PatternGroup],
    policy: CollisionPolicy,
) -> Result<EntryMap> {
    let source = source.as_ref();
    let mut entries = EntryMap::new();

    for group in groups {
        for file in glob_files(source, group)? {
            match entry_name(source, &file) {
                Some(name) => {
                    debug!("Entry '{}' -> {}", name, file.display());
                    entries.insert(name, file, policy)?;
                }
                None => debug!("No entry name for {}", file.display()),
            }
        }
    }

    Ok(entries)
}
