//! Default values for assetwire configuration.
//!
//! This module provides centralized default values used across the
//! library and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

use crate::pattern::PatternGroup;

/// Source directory relative to the project root.
pub const SOURCE_DIR: &str = "resources";

/// Output directory relative to the project root.
pub const OUTPUT_DIR: &str = "assets";

/// Key of the build block inside the project `package.json`.
pub const MANIFEST_KEY: &str = "assetwire";

/// Project name used when the manifest does not declare one.
pub const UNKNOWN_PACKAGE: &str = "unknown-package";

/// Chunk file name template for split chunks.
pub const CHUNK_FILENAME: &str = "chunks/[name].js";

/// Entry name prefixes that keep their full file stem.
pub const RESERVED_PREFIXES: &[&str] = &["admin-", "frontend-"];

/// Host-provided globals that are never bundled.
pub const HOST_EXTERNALS: &[(&str, &str)] =
    &[("lodash", "lodash"), ("jquery", "jQuery"), ("$", "jQuery")];

/// Returns the asset entry pattern groups, one group per category.
///
/// Within a group the flat convention is tried before the nested one, so a
/// category that has top-level files never picks up nested ones.
pub fn asset_patterns() -> Vec<PatternGroup> {
    vec![
        PatternGroup::new(["scripts/[!_]*.{js,jsx,ts}", "scripts/*/[!_]*.{js,jsx,ts}"]),
        PatternGroup::new([
            "styles/[!_]*.{scss,sass,css}",
            "styles/*/[!_]*.{scss,sass,css}",
        ]),
        PatternGroup::new([
            "client/index.{js,jsx,ts}",
            "client/*/index.{js,jsx,ts}",
            "client/*/*/index.{js,jsx,ts}",
        ]),
    ]
}

/// Returns the package manifest pattern groups.
pub fn package_patterns() -> Vec<PatternGroup> {
    vec![PatternGroup::new(["packages/*/package.json"])]
}

/// Returns the default static copy rules as `(from, to)` pairs.
pub fn copy_rules() -> Vec<(&'static str, Option<&'static str>)> {
    vec![
        ("images/**/*.{jpg,jpeg,png,gif,svg}", Some("images/[name][ext]")),
        ("fonts/**/*.{woff,woff2,eot,ttf,otf}", None),
    ]
}

/// Returns the default transpiler cache directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/assetwire/babel` (XDG Base Directory)
/// - macOS: `~/Library/Caches/assetwire/babel`
/// - Windows: `{FOLDERID_LocalAppData}\assetwire\babel`
///
/// Falls back to `.assetwire-cache/babel` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `BABEL_CACHE_DIRECTORY` environment
/// variable.
pub fn default_babel_cache() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("assetwire"))
        .unwrap_or_else(|| PathBuf::from(".assetwire-cache"))
        .join("babel")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_babel_cache_returns_path() {
        let cache = default_babel_cache();
        assert!(cache.ends_with("babel"));
    }

    #[test]
    fn test_default_babel_cache_is_absolute_or_fallback() {
        let cache = default_babel_cache();
        assert!(
            cache.is_absolute() || cache.starts_with(".assetwire-cache"),
            "Expected absolute path or fallback, got: {:?}",
            cache
        );
    }

    #[test]
    fn test_asset_patterns_cover_categories() {
        let groups = asset_patterns();
        assert_eq!(groups.len(), 3);
        assert!(groups[0].patterns()[0].starts_with("scripts/"));
        assert!(groups[1].patterns()[0].starts_with("styles/"));
        assert!(groups[2].patterns()[0].starts_with("client/"));
    }
}
