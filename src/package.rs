//! Package discovery and package descriptors.
//!
//! A package is a directory with its own `package.json` inside the source
//! tree (by default `packages/*/package.json`). Only manifests declaring both
//! `name` and `main` are buildable; everything else is skipped silently.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::pattern::{PatternGroup, glob_files};

/// Scope of a package name (`@acme` for `@acme/blocks`), if any.
pub fn package_scope(name: &str) -> Option<&str> {
    if name.starts_with('@') {
        name.split('/').next()
    } else {
        None
    }
}

/// Package name without its scope.
pub fn package_name(name: &str) -> &str {
    if name.starts_with('@') {
        name.split('/').nth(1).unwrap_or("")
    } else {
        name
    }
}

/// Namespace of a package name: `@acme/` when scoped, empty otherwise.
pub fn namespace(name: &str) -> String {
    package_scope(name)
        .map(|scope| format!("{}/", scope))
        .unwrap_or_default()
}

/// Name under which the host environment exposes the package.
///
/// The scope without its leading `@`, or the package name when unscoped.
pub fn external_name(name: &str) -> &str {
    match package_scope(name) {
        Some(scope) => &scope[1..],
        None => package_name(name),
    }
}

/// Asset handle name; currently identical to [`external_name`].
pub fn handle_name(name: &str) -> &str {
    external_name(name)
}

/// Everything the build needs to know about one discovered package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    /// Raw name from the manifest
    pub name: String,
    pub scope: Option<String>,
    pub package_name: String,
    pub namespace: String,
    pub external_name: String,
    pub handle_name: String,
    /// Absolute path of the main entry file
    pub main: PathBuf,
    /// Directory holding the manifest
    pub path: PathBuf,
    #[serde(skip)]
    pub manifest: JsonValue,
}

impl PackageDescriptor {
    /// Build a descriptor from a declared name, main entry and package directory.
    pub fn new(name: &str, main: &str, dir: &Path, manifest: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            scope: package_scope(name).map(str::to_string),
            package_name: package_name(name).to_string(),
            namespace: namespace(name),
            external_name: external_name(name).to_string(),
            handle_name: handle_name(name).to_string(),
            main: dir.join(main.trim_start_matches("./")),
            path: dir.to_path_buf(),
            manifest,
        }
    }

    /// Read a manifest and build its descriptor.
    ///
    /// Returns `Ok(None)` when the manifest lacks a non-empty `name` or
    /// `main`. Read and parse failures are errors; [`discover_packages`]
    /// downgrades them to warnings.
    pub fn from_manifest(manifest_path: impl AsRef<Path>) -> Result<Option<Self>> {
        let manifest_path = manifest_path.as_ref();
        let content = fs::read_to_string(manifest_path).map_err(|e| Error::Manifest {
            path: manifest_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let manifest: JsonValue = serde_json::from_str(&content).map_err(|e| Error::Manifest {
            path: manifest_path.to_path_buf(),
            message: e.to_string(),
        })?;

        let field = |key: &str| {
            manifest
                .get(key)
                .and_then(JsonValue::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let (Some(name), Some(main)) = (field("name"), field("main")) else {
            debug!(
                "Skipping {}: manifest needs both 'name' and 'main'",
                manifest_path.display()
            );
            return Ok(None);
        };

        let dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Some(Self::new(&name, &main, dir, manifest)))
    }

    /// Entry name of the package bundle.
    pub fn entry_name(&self) -> String {
        format!("packages/{}", self.package_name)
    }
}

/// Discover package descriptors for every pattern group under `source`.
///
/// Descriptors keep discovery order: groups in order, files sorted within
/// the matching pattern of each group.
pub fn discover_packages(
    source: impl AsRef<Path>,
    groups: &[PatternGroup],
) -> Result<Vec<PackageDescriptor>> {
    let source = source.as_ref();
    let mut packages = Vec::new();

    for group in groups {
        for manifest in glob_files(source, group)? {
            match PackageDescriptor::from_manifest(&manifest) {
                Ok(Some(descriptor)) => {
                    debug!("Package '{}' at {}", descriptor.name, descriptor.path.display());
                    packages.push(descriptor);
                }
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            }
        }
    }

    Ok(packages)
}

/// Directories of package manifests that declare a `module` or `main` build.
///
/// Used by the batch builder, which also accepts module-only packages that
/// have no bundle entry.
pub fn discover_package_roots(
    source: impl AsRef<Path>,
    groups: &[PatternGroup],
) -> Result<Vec<PathBuf>> {
    let source = source.as_ref();
    let mut roots = Vec::new();

    for group in groups {
        for manifest_path in glob_files(source, group)? {
            let manifest: JsonValue = match fs::read_to_string(&manifest_path)
                .map_err(Error::from)
                .and_then(|content| serde_json::from_str(&content).map_err(Error::from))
            {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!("Skipping {}: {}", manifest_path.display(), e);
                    continue;
                }
            };
            let declares = |key: &str| {
                manifest
                    .get(key)
                    .and_then(JsonValue::as_str)
                    .is_some_and(|value| !value.is_empty())
            };
            if (declares("module") || declares("main"))
                && let Some(dir) = manifest_path.parent()
                && !roots.iter().any(|root: &PathBuf| root == dir)
            {
                roots.push(dir.to_path_buf());
            }
        }
    }

    Ok(roots)
}
