//! Project context: root discovery, manifest settings and environment.
//!
//! Everything the discovery and composition steps need is resolved once into
//! an immutable [`ProjectContext`] and passed explicitly. Nothing is cached
//! process-wide, so several projects can be composed in one process.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults ([`crate::defaults`]);
//! 2. the `"assetwire"` block of the project `package.json`;
//! 3. environment variables ([`EnvOverrides`]);
//! 4. explicit builder calls (used by the CLI flags).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::defaults;
use crate::error::{Error, Result};
use crate::pattern::PatternGroup;
use crate::plugins::CopyPattern;

/// Build mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        self == Mode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

/// The `"assetwire"` block of the project manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSettings {
    /// Source directory relative to the project root
    pub source: Option<String>,
    /// Output directory relative to the project root
    pub output: Option<String>,
    /// Extra asset pattern groups, evaluated after the defaults
    pub asset_patterns: Vec<PatternGroup>,
    /// Extra package manifest pattern groups, evaluated after the defaults
    pub package_patterns: Vec<PatternGroup>,
    /// Extra static copy rules
    pub copy_patterns: Vec<CopyPattern>,
    /// Library type for package bundles (defaults to `window`)
    pub package_type: Option<String>,
    /// Global library name for package bundles
    pub library_name: Option<String>,
    /// Development URL proxied by the live-reload server
    pub dev_url: Option<String>,
}

impl ProjectSettings {
    /// Extract the settings block from a parsed manifest.
    pub fn from_manifest(manifest: &JsonValue) -> Result<Self> {
        match manifest.get(defaults::MANIFEST_KEY) {
            None | Some(JsonValue::Null) => Ok(Self::default()),
            Some(block) => serde_json::from_value(block.clone()).map_err(|e| Error::ConfigParse {
                message: format!("invalid \"{}\" block: {}", defaults::MANIFEST_KEY, e),
                hint: Some(
                    "Pattern options are arrays of arrays of glob strings, e.g. [[\"scripts/*.js\"]]"
                        .to_string(),
                ),
            }),
        }
    }
}

/// Build switches read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `WP_SOURCE_PATH`
    pub source_path: Option<String>,
    /// `WP_OUTPUT_PATH`
    pub output_path: Option<String>,
    /// `WP_NO_EXTERNALS`
    pub no_externals: bool,
    /// `WP_BUNDLE_ANALYZER`
    pub bundle_analyzer: bool,
    /// `BABEL_CACHE_DIRECTORY`
    pub babel_cache_directory: Option<PathBuf>,
    /// `NODE_ENV`
    pub mode: Option<Mode>,
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "" | "0" | "false" | "no" | "off")
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            source_path: non_empty("WP_SOURCE_PATH"),
            output_path: non_empty("WP_OUTPUT_PATH"),
            no_externals: lookup("WP_NO_EXTERNALS").is_some_and(|v| is_truthy(&v)),
            bundle_analyzer: lookup("WP_BUNDLE_ANALYZER").is_some_and(|v| is_truthy(&v)),
            babel_cache_directory: non_empty("BABEL_CACHE_DIRECTORY").map(PathBuf::from),
            mode: non_empty("NODE_ENV").and_then(|v| v.parse().ok()),
        }
    }
}

static DASH_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([a-z])").expect("valid regex"));

static UPPER_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])").expect("valid regex"));

/// Converts a dash-delimited string to camelCase (`blocks-navigation` ->
/// `blocksNavigation`).
pub fn camel_case_dash(input: &str) -> String {
    DASH_LETTER
        .replace_all(input, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

/// Converts camelCase or snake_case to lower-case dashes.
pub fn lower_case_dash(input: &str) -> String {
    let dashed = UPPER_LETTER.replace_all(input, "-$1").replace('_', "-").to_lowercase();
    dashed.strip_prefix('-').unwrap_or(&dashed).to_string()
}

/// Removes `@` and `/` from a namespace (`@wp-packages/` -> `wp-packages`).
pub fn format_namespace(namespace: &str) -> String {
    namespace.replace(['@', '/'], "")
}

/// Find the nearest `package.json` at or above `start`.
pub fn find_manifest(start: impl AsRef<Path>) -> Option<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .map(|dir| dir.join("package.json"))
        .find(|candidate| candidate.is_file())
}

/// Immutable description of one project for a discovery pass.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Directory containing the project manifest (or the start directory)
    pub root: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub manifest: JsonValue,
    pub project_name: String,
    pub settings: ProjectSettings,
    pub env: EnvOverrides,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub mode: Mode,
}

impl ProjectContext {
    /// Discover the project enclosing `start`, reading the process environment.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        Self::discover_with_env(start, EnvOverrides::from_env())
    }

    /// Discover the project enclosing `start` with explicit overrides.
    pub fn discover_with_env(start: impl AsRef<Path>, env: EnvOverrides) -> Result<Self> {
        let start = start.as_ref();
        let (root, manifest_path, manifest) = match find_manifest(start) {
            Some(path) => {
                let content = fs::read_to_string(&path)?;
                let manifest: JsonValue =
                    serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                        message: format!("{}: {}", path.display(), e),
                        hint: None,
                    })?;
                let root = path.parent().unwrap_or(start).to_path_buf();
                (root, Some(path), manifest)
            }
            None => {
                debug!("No package.json found above {}", start.display());
                (start.to_path_buf(), None, JsonValue::Object(Default::default()))
            }
        };

        Self::from_parts(root, manifest_path, manifest, env)
    }

    /// Build a context from an already-loaded manifest.
    pub fn from_parts(
        root: PathBuf,
        manifest_path: Option<PathBuf>,
        manifest: JsonValue,
        env: EnvOverrides,
    ) -> Result<Self> {
        let settings = ProjectSettings::from_manifest(&manifest)?;
        let project_name = manifest
            .get("name")
            .and_then(JsonValue::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(defaults::UNKNOWN_PACKAGE)
            .to_string();

        let source = env
            .source_path
            .clone()
            .or_else(|| settings.source.clone())
            .unwrap_or_else(|| defaults::SOURCE_DIR.to_string());
        let output = env
            .output_path
            .clone()
            .or_else(|| settings.output.clone())
            .unwrap_or_else(|| defaults::OUTPUT_DIR.to_string());

        let context = Self {
            source_path: root.join(source),
            output_path: root.join(output),
            mode: env.mode.unwrap_or_default(),
            root,
            manifest_path,
            manifest,
            project_name,
            settings,
            env,
        };
        debug!(
            "Project '{}': source {}, output {}",
            context.project_name,
            context.source_path.display(),
            context.output_path.display()
        );
        Ok(context)
    }

    /// Override the source directory (relative paths resolve against the root).
    pub fn with_source(mut self, source: impl AsRef<Path>) -> Self {
        self.source_path = self.root.join(source);
        self
    }

    /// Override the output directory (relative paths resolve against the root).
    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output_path = self.root.join(output);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Default asset groups followed by the manifest's extra groups.
    pub fn asset_patterns(&self) -> Vec<PatternGroup> {
        let mut groups = defaults::asset_patterns();
        groups.extend(self.settings.asset_patterns.iter().cloned());
        groups
    }

    /// Default package groups followed by the manifest's extra groups.
    pub fn package_patterns(&self) -> Vec<PatternGroup> {
        let mut groups = defaults::package_patterns();
        groups.extend(self.settings.package_patterns.iter().cloned());
        groups
    }

    /// Default copy rules (rooted at the source directory) plus extra rules.
    pub fn copy_patterns(&self) -> Vec<CopyPattern> {
        let mut patterns: Vec<CopyPattern> = defaults::copy_rules()
            .into_iter()
            .map(|(from, to)| CopyPattern::new(from, to, &self.source_path))
            .collect();
        patterns.extend(self.settings.copy_patterns.iter().cloned());
        patterns
    }

    /// Project namespace (`@acme/theme` -> `acmetheme`).
    pub fn project_namespace(&self) -> String {
        format_namespace(&self.project_name)
    }

    /// Project global name (`my-theme` -> `myTheme`).
    pub fn project_external(&self) -> String {
        camel_case_dash(&self.project_name)
    }

    /// Project handle (`MyTheme` -> `my-theme`).
    pub fn project_handle(&self) -> String {
        lower_case_dash(&self.project_name)
    }

    /// Transpiler cache directory.
    pub fn babel_cache_directory(&self) -> PathBuf {
        self.env
            .babel_cache_directory
            .clone()
            .unwrap_or_else(defaults::default_babel_cache)
    }
}
