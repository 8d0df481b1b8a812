//! Bundler configuration composer.
//!
//! [`Composer::compose`] takes a caller-supplied base configuration, runs
//! entry and package discovery for a [`ProjectContext`], and produces a fresh
//! configuration object. The layers are applied in a fixed order, each one
//! winning over the previous:
//!
//! 1. the base configuration;
//! 2. entries: base entries, then discovered assets, then package bundles;
//! 3. `output`, `resolve`, `externals`, `stats`, `optimization`,
//!    `performance` defaults of the project;
//! 4. plugins: base plugins followed by the fixed plugin set;
//! 5. the caller's [`Override`].
//!
//! The base is validated before any filesystem access, so a bad base is
//! always reported as such, never masked by a discovery failure.

use std::fmt;
use std::path::Path;

use log::{debug, info};
use serde_json::{Map, Value as JsonValue, json};

use crate::defaults::{CHUNK_FILENAME, HOST_EXTERNALS};
use crate::entry::{CollisionPolicy, EntryMap, discover_assets};
use crate::error::{Error, Result};
use crate::merge::deep_merge;
use crate::package::{PackageDescriptor, discover_packages};
use crate::plugins::fixed_plugins;
use crate::project::{ProjectContext, camel_case_dash};

type Producer = Box<dyn Fn() -> JsonValue>;
type Transform = Box<dyn Fn(&JsonValue) -> JsonValue>;

/// Caller-supplied starting configuration.
pub enum BaseConfig {
    /// A configuration value
    Value(JsonValue),
    /// A function producing the configuration on demand
    Producer(Producer),
}

impl BaseConfig {
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn() -> JsonValue + 'static,
    {
        BaseConfig::Producer(Box::new(f))
    }

    /// Produce a private copy of the base and check its shape.
    fn resolve(&self) -> Result<Map<String, JsonValue>> {
        let value = match self {
            BaseConfig::Value(value) => value.clone(),
            BaseConfig::Producer(produce) => produce(),
        };
        match value {
            JsonValue::Object(map) => {
                check_sections(&map)?;
                Ok(map)
            }
            JsonValue::Null => Err(Error::InvalidBaseConfig {
                message: "a base configuration is required".to_string(),
            }),
            other => Err(Error::InvalidBaseConfig {
                message: format!("expected an object, got {}", json_type(&other)),
            }),
        }
    }
}

/// Reject base sections the composer cannot extend.
fn check_sections(config: &Map<String, JsonValue>) -> Result<()> {
    match config.get("entry") {
        None
        | Some(
            JsonValue::Null | JsonValue::Object(_) | JsonValue::String(_) | JsonValue::Array(_),
        ) => {}
        Some(other) => {
            return Err(Error::InvalidBaseConfig {
                message: format!("'entry' must be an object, got {}", json_type(other)),
            });
        }
    }
    match config.get("plugins") {
        None | Some(JsonValue::Null | JsonValue::Array(_)) => Ok(()),
        Some(other) => Err(Error::InvalidBaseConfig {
            message: format!("'plugins' must be an array, got {}", json_type(other)),
        }),
    }
}

impl From<JsonValue> for BaseConfig {
    fn from(value: JsonValue) -> Self {
        BaseConfig::Value(value)
    }
}

impl fmt::Debug for BaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseConfig::Value(value) => f.debug_tuple("Value").field(value).finish(),
            BaseConfig::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Caller adjustment applied after composition.
pub enum Override {
    /// Extra entries merged into `entry`
    Entries(Map<String, JsonValue>),
    /// A function receiving the composed configuration and returning a
    /// partial configuration that is deep-merged on top of it
    Transform(Transform),
}

impl Override {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&JsonValue) -> JsonValue + 'static,
    {
        Override::Transform(Box::new(f))
    }

    fn apply(&self, config: &mut JsonValue) -> Result<()> {
        match self {
            Override::Entries(entries) => {
                deep_merge(config, &json!({ "entry": entries }));
            }
            Override::Transform(transform) => {
                let partial = transform(config);
                if !partial.is_object() {
                    return Err(Error::InvalidOverride {
                        message: format!(
                            "override function must return an object, got {}",
                            json_type(&partial)
                        ),
                    });
                }
                deep_merge(config, &partial);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Entries(entries) => f.debug_tuple("Entries").field(entries).finish(),
            Override::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

fn path_value(path: &Path) -> JsonValue {
    JsonValue::String(path.to_string_lossy().into_owned())
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub entries: EntryMap,
    pub packages: Vec<PackageDescriptor>,
}

/// Composes bundler configurations for one project.
#[derive(Debug, Clone)]
pub struct Composer<'a> {
    ctx: &'a ProjectContext,
    policy: CollisionPolicy,
}

impl<'a> Composer<'a> {
    pub fn new(ctx: &'a ProjectContext) -> Self {
        Self {
            ctx,
            policy: CollisionPolicy::default(),
        }
    }

    /// Select how entry-name collisions are handled.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check every configured pattern group without touching the filesystem.
    pub fn validate_patterns(&self) -> Result<()> {
        for group in self.ctx.asset_patterns().iter().chain(self.ctx.package_patterns().iter()) {
            group.validate()?;
        }
        Ok(())
    }

    /// Discover asset entries and packages under the source directory.
    pub fn discover(&self) -> Result<Discovery> {
        let source = &self.ctx.source_path;
        let entries = discover_assets(source, &self.ctx.asset_patterns(), self.policy)?;
        let packages = discover_packages(source, &self.ctx.package_patterns())?;
        info!(
            "Discovered {} entr{} and {} package(s) in {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            packages.len(),
            source.display()
        );
        Ok(Discovery { entries, packages })
    }

    /// Compose the final configuration.
    pub fn compose(&self, base: &BaseConfig, overrides: Option<&Override>) -> Result<JsonValue> {
        let base = base.resolve()?;
        self.validate_patterns()?;
        let discovery = self.discover()?;
        self.compose_with(base, &discovery, overrides)
    }

    /// Compose from an already-resolved base and discovery result.
    fn compose_with(
        &self,
        mut config: Map<String, JsonValue>,
        discovery: &Discovery,
        overrides: Option<&Override>,
    ) -> Result<JsonValue> {
        let ctx = self.ctx;
        let production = ctx.mode.is_production();

        let entry = self.entry_section(config.remove("entry"), discovery);
        config.insert("entry".to_string(), JsonValue::Object(entry));

        let mut output = take_object(&mut config, "output");
        output.insert("path".to_string(), path_value(&ctx.output_path));
        output.insert("chunkFilename".to_string(), json!(CHUNK_FILENAME));
        output.insert("enabledLibraryTypes".to_string(), json!(["window", "commonjs"]));
        config.insert("output".to_string(), JsonValue::Object(output));

        let mut resolve = take_object(&mut config, "resolve");
        resolve.insert(
            "modules".to_string(),
            json!([
                path_value(&ctx.root.join("node_modules")),
                path_value(&ctx.source_path.join("node_modules")),
            ]),
        );
        config.insert("resolve".to_string(), JsonValue::Object(resolve));

        let externals = self.externals_section(take_object(&mut config, "externals"), discovery);
        config.insert("externals".to_string(), JsonValue::Object(externals));

        config.insert(
            "stats".to_string(),
            json!({
                "all": false,
                "errors": true,
                "warnings": true,
                "assets": true,
                "colors": true,
                "builtAt": false,
                "timings": true,
                "version": false,
            }),
        );

        let mut optimization = take_object(&mut config, "optimization");
        optimization.insert(
            "concatenateModules".to_string(),
            json!(production && !ctx.env.bundle_analyzer),
        );
        optimization.insert(
            "splitChunks".to_string(),
            json!({
                "cacheGroups": {
                    "style": {
                        "type": "css/mini-extract",
                        "test": "[\\\\/](\\.module)?\\.(sc|sa|c)ss$",
                        "chunks": "all",
                        "enforce": true,
                    },
                    "default": false,
                }
            }),
        );
        config.insert("optimization".to_string(), JsonValue::Object(optimization));

        let (max_asset, max_entrypoint) = if production { (100, 400) } else { (10_000, 40_000) };
        config.insert(
            "performance".to_string(),
            json!({
                "maxAssetSize": max_asset * 1024,
                "maxEntrypointSize": max_entrypoint * 1024,
                "hints": "warning",
            }),
        );

        config
            .entry("mode".to_string())
            .or_insert_with(|| json!(ctx.mode.as_str()));
        config
            .entry("devtool".to_string())
            .or_insert_with(|| if production { json!(false) } else { json!("source-map") });

        let mut plugins: Vec<JsonValue> = match config.remove("plugins") {
            Some(JsonValue::Array(items)) => items.into_iter().filter(|p| !p.is_null()).collect(),
            _ => Vec::new(),
        };
        for plugin in fixed_plugins(ctx) {
            plugins.push(serde_json::to_value(plugin)?);
        }
        config.insert("plugins".to_string(), JsonValue::Array(plugins));

        let mut config = JsonValue::Object(config);
        if let Some(overrides) = overrides {
            debug!("Applying override {:?}", overrides);
            overrides.apply(&mut config)?;
        }

        Ok(config)
    }

    fn entry_section(
        &self,
        base_entry: Option<JsonValue>,
        discovery: &Discovery,
    ) -> Map<String, JsonValue> {
        let mut entry = match base_entry {
            Some(JsonValue::Object(map)) => map,
            // A bare string or array is the bundler's unnamed `main` entry.
            Some(value @ (JsonValue::String(_) | JsonValue::Array(_))) => {
                let mut map = Map::new();
                map.insert("main".to_string(), value);
                map
            }
            _ => Map::new(),
        };

        for (name, file) in discovery.entries.iter() {
            entry.insert(name.clone(), path_value(file));
        }

        let library_type = self
            .ctx
            .settings
            .package_type
            .clone()
            .unwrap_or_else(|| "window".to_string());
        for package in &discovery.packages {
            entry.insert(
                package.entry_name(),
                json!({
                    "import": path_value(&package.main),
                    "library": {
                        "name": self.library_path(package),
                        "type": library_type,
                    },
                }),
            );
        }

        entry
    }

    fn externals_section(
        &self,
        mut externals: Map<String, JsonValue>,
        discovery: &Discovery,
    ) -> Map<String, JsonValue> {
        for (request, global) in HOST_EXTERNALS {
            externals.insert(request.to_string(), json!(global));
        }
        if !self.ctx.env.no_externals {
            for package in &discovery.packages {
                externals.insert(package.name.clone(), json!(self.library_path(package)));
            }
        }
        externals
    }

    /// Global path under which a package bundle is exposed: `[library, name]`.
    fn library_path(&self, package: &PackageDescriptor) -> Vec<String> {
        let library = self
            .ctx
            .settings
            .library_name
            .clone()
            .unwrap_or_else(|| camel_case_dash(&package.external_name));
        vec![library, camel_case_dash(&package.package_name)]
    }
}

/// Remove `key` from `config` and return it as an object (empty if absent).
fn take_object(config: &mut Map<String, JsonValue>, key: &str) -> Map<String, JsonValue> {
    match config.remove(key) {
        Some(JsonValue::Object(map)) => map,
        _ => Map::new(),
    }
}
