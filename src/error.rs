//! # Error Handling
//!
//! This module defines the centralized error type for `assetwire`. It uses
//! `thiserror` to derive a single `Error` enum covering every failure mode
//! the library reports, plus a `Result<T>` alias used throughout the crate.
//!
//! Errors fall into three groups:
//!
//! - **Configuration errors** (`InvalidBaseConfig`, `InvalidOverride`,
//!   `InvalidPattern`, `ConfigParse`): raised before any filesystem
//!   discovery runs.
//! - **Discovery errors** (`EntryCollision`, `Manifest`): only raised when
//!   the caller asked for strict behavior. Empty glob results and
//!   incomplete package manifests are never errors.
//! - **Build errors** (`Transform`, `Watch`): reported per file by the
//!   batch builder and the watch loop.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for assetwire operations
#[derive(Error, Debug)]
pub enum Error {
    /// The base bundler configuration is missing or not a JSON object.
    #[error("Invalid base configuration: {message}")]
    InvalidBaseConfig { message: String },

    /// An override could not be applied to the composed configuration.
    #[error("Invalid override: {message}")]
    InvalidOverride { message: String },

    /// A project configuration value could not be parsed.
    ///
    /// Includes an optional hint about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A glob pattern could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Two source files produced the same entry name under the strict
    /// collision policy.
    #[error("Entry '{name}' is produced by both {} and {}", first.display(), second.display())]
    EntryCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A package manifest could not be read or parsed.
    #[error("Manifest error for {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// A per-file transform failed during a batch build.
    #[error("Transform failed for {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    /// The file watcher could not be set up.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
