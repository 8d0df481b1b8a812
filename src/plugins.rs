//! Declarative descriptors for the fixed build plugin set.
//!
//! Plugins are not executed here. Each one is emitted as
//! `{"plugin": "<package>", "options": {...}}` and instantiated by the
//! bundler-side loader. Options that are regular expressions on the bundler
//! side are emitted as pattern strings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::project::ProjectContext;

/// One static copy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPattern {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub no_error_on_missing: bool,
}

fn default_true() -> bool {
    true
}

impl CopyPattern {
    pub fn new(from: &str, to: Option<&str>, context: &Path) -> Self {
        Self {
            from: from.to_string(),
            to: to.map(str::to_string),
            context: Some(context.to_path_buf()),
            no_error_on_missing: true,
        }
    }
}

/// A plugin the bundler should instantiate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSpec {
    pub plugin: String,
    pub options: JsonValue,
}

impl PluginSpec {
    pub fn new(plugin: &str, options: JsonValue) -> Self {
        Self {
            plugin: plugin.to_string(),
            options,
        }
    }
}

/// Build the plugin list for a project, in application order.
///
/// Image compression must follow the copy step, so its position is fixed.
pub fn fixed_plugins(ctx: &ProjectContext) -> Vec<PluginSpec> {
    let production = ctx.mode.is_production();
    let mut plugins = vec![
        PluginSpec::new("copy-webpack-plugin", json!({ "patterns": ctx.copy_patterns() })),
        PluginSpec::new(
            "mini-css-extract-plugin",
            json!({ "filename": "[name].css", "chunkFilename": "[id].css" }),
        ),
        PluginSpec::new("webpack-rtl-plugin", json!({ "filename": ["(\\.css)", "-rtl$1"] })),
        PluginSpec::new(
            "imagemin-webpack-plugin",
            json!({ "disable": !production, "test": "\\.(jpe?g|png|gif|svg)$" }),
        ),
    ];

    if !ctx.env.no_externals {
        plugins.push(PluginSpec::new(
            "@wordpress/dependency-extraction-webpack-plugin",
            json!({ "injectPolyfill": true }),
        ));
    }

    if !production && let Some(dev_url) = &ctx.settings.dev_url {
        plugins.push(PluginSpec::new(
            "browser-sync-webpack-plugin",
            json!({
                "host": "localhost",
                "port": 3000,
                "proxy": dev_url,
                "open": false,
                "files": ["**/*.php", format!("{}/**/*.css", output_dir_name(ctx))],
            }),
        ));
    }

    if ctx.env.bundle_analyzer {
        plugins.push(PluginSpec::new("webpack-bundle-analyzer", json!({})));
    }

    plugins.extend([
        PluginSpec::new("moment-timezone-data-webpack-plugin", json!({ "startYear": 2000 })),
        PluginSpec::new(
            "webpack-remove-empty-scripts",
            json!({ "stage": "after-process-plugins", "remove": "\\.(js)$" }),
        ),
        PluginSpec::new("webpackbar", json!({})),
    ]);

    plugins
}

fn output_dir_name(ctx: &ProjectContext) -> String {
    ctx.output_path
        .strip_prefix(&ctx.root)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| ctx.output_path.to_string_lossy().into_owned())
}
