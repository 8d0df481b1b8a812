//! JSON deep merge and path assignment for bundler configurations.
//!
//! [`deep_merge`] follows the semantics bundler users expect from config
//! merging helpers:
//!
//! - objects merge key by key, recursively;
//! - arrays concatenate (incoming items after existing ones);
//! - any other combination is replaced by the incoming value.
//!
//! [`set_path`] assigns a value at a dotted path such as
//! `output.library.name` or `plugins[0].options`, creating intermediate
//! objects and arrays on the way.

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

/// A segment of a configuration path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

/// Parse `a.b[0].c` into segments.
///
/// Bracketed content that is not a number is treated as a key, which allows
/// keys containing dots: `resolve.alias[lodash-es]`.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    let flush = |current: &mut String, segments: &mut Vec<PathSegment>| {
        if !current.is_empty() {
            segments.push(PathSegment::Key(std::mem::take(current)));
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '.' => flush(&mut current, &mut segments),
            '[' => {
                flush(&mut current, &mut segments);
                let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                let inner = inner.trim().trim_matches(|c| c == '"' || c == '\'');
                match inner.parse::<usize>() {
                    Ok(index) => segments.push(PathSegment::Index(index)),
                    Err(_) if !inner.is_empty() => segments.push(PathSegment::Key(inner.to_string())),
                    Err(_) => {}
                }
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut segments);

    segments
}

/// Walk to `path` inside `value`, creating missing containers.
///
/// An index may address an existing element or append one right after the
/// last; anything further out is rejected.
pub fn navigate_json_value<'a>(
    value: &'a mut JsonValue,
    path: &[PathSegment],
) -> Result<&'a mut JsonValue> {
    let mut current = value;
    for segment in path {
        current = match segment {
            PathSegment::Key(key) => {
                if current.is_null() {
                    *current = JsonValue::Object(Map::new());
                }
                let JsonValue::Object(map) = current else {
                    return Err(Error::InvalidOverride {
                        message: format!("expected an object while navigating to '{}'", key),
                    });
                };
                map.entry(key.clone()).or_insert(JsonValue::Null)
            }
            PathSegment::Index(idx) => {
                if current.is_null() {
                    *current = JsonValue::Array(Vec::new());
                }
                let JsonValue::Array(array) = current else {
                    return Err(Error::InvalidOverride {
                        message: format!("expected an array while navigating to index {}", idx),
                    });
                };
                if *idx > array.len() {
                    return Err(Error::InvalidOverride {
                        message: format!(
                            "index {} is past the end of an array of length {}",
                            idx,
                            array.len()
                        ),
                    });
                }
                if *idx == array.len() {
                    array.push(JsonValue::Null);
                }
                &mut array[*idx]
            }
        };
    }
    Ok(current)
}

/// Assign `value` at a dotted `path`, replacing what was there.
pub fn set_path(target: &mut JsonValue, path: &str, value: JsonValue) -> Result<()> {
    let segments = parse_path(path);
    if segments.is_empty() {
        return Err(Error::InvalidOverride {
            message: format!("empty configuration path '{}'", path),
        });
    }
    *navigate_json_value(target, &segments)? = value;
    Ok(())
}

/// Recursively merge `source` into `target`.
pub fn deep_merge(target: &mut JsonValue, source: &JsonValue) {
    match (target, source) {
        (JsonValue::Object(target_map), JsonValue::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (JsonValue::Array(target_array), JsonValue::Array(source_array)) => {
            target_array.extend(source_array.iter().cloned());
        }
        (target, source) => *target = source.clone(),
    }
}
