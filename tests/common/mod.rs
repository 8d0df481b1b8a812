//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a project fixture and common manifests to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_theme_layout();
//!     fixture.command().arg("entries").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Common `package.json` snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// Theme project without a settings block.
    pub const THEME: &str = r#"{"name": "my-theme"}"#;

    /// Theme project with custom directories.
    pub const CUSTOM_DIRS: &str = r#"{
  "name": "my-theme",
  "assetwire": {"source": "src", "output": "dist"}
}"#;

    /// Theme project with an invalid settings block.
    pub const INVALID_BLOCK: &str = r#"{
  "name": "my-theme",
  "assetwire": {"assetPatterns": "scripts/*.js"}
}"#;

    /// Buildable scoped package.
    pub const BLOCKS_PACKAGE: &str = r#"{"name": "@acme/blocks", "main": "src/index.js"}"#;

    /// Package without a main entry.
    pub const DOCS_PACKAGE: &str = r#"{"name": "docs"}"#;
}

/// A temporary project directory.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_manifest(manifests::THEME)
///     .with_file("resources/scripts/app.js", "");
///
/// let mut cmd = cargo_bin_cmd!("assetwire");
/// cmd.current_dir(fixture.path())
///     .arg("entries")
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the project `package.json`.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("package.json", content)
    }

    /// A theme with scripts, styles, a client app and two packages (one
    /// buildable).
    #[allow(dead_code)]
    pub fn with_theme_layout(self) -> Self {
        self.with_manifest(manifests::THEME)
            .with_file("resources/scripts/app.js", "")
            .with_file("resources/scripts/_partial.js", "")
            .with_file("resources/styles/admin/admin-settings.scss", "")
            .with_file("resources/client/widget/index.js", "")
            .with_file("resources/packages/blocks/package.json", manifests::BLOCKS_PACKAGE)
            .with_file("resources/packages/blocks/src/index.js", "")
            .with_file("resources/packages/docs/package.json", manifests::DOCS_PACKAGE)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    ///
    /// Environment variables read by the project context are cleared so
    /// the caller's shell cannot leak into the test.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("assetwire");
        cmd.current_dir(self.path())
            .env_remove("WP_SOURCE_PATH")
            .env_remove("WP_OUTPUT_PATH")
            .env_remove("WP_NO_EXTERNALS")
            .env_remove("WP_BUNDLE_ANALYZER")
            .env_remove("NODE_ENV")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_theme_layout() {
        let fixture = TestFixture::new().with_theme_layout();
        assert!(fixture.path().join("package.json").exists());
        assert!(fixture.path().join("resources/packages/blocks/src/index.js").exists());
    }

    #[test]
    fn test_manifests_are_valid_json() {
        for manifest in [
            manifests::THEME,
            manifests::CUSTOM_DIRS,
            manifests::INVALID_BLOCK,
            manifests::BLOCKS_PACKAGE,
            manifests::DOCS_PACKAGE,
        ] {
            serde_json::from_str::<serde_json::Value>(manifest).expect("manifest should be JSON");
        }
    }
}
