//! # assetwire
//!
//! Entry discovery and bundler configuration composition for CMS plugin and
//! theme assets. The library is used by the `assetwire` command-line tool but
//! can be embedded by any build driver that needs the same conventions.
//!
//! ## Quick Example
//!
//! ```no_run
//! use assetwire::compose::{BaseConfig, Composer};
//! use assetwire::project::ProjectContext;
//! use serde_json::json;
//!
//! let ctx = ProjectContext::discover(".").unwrap();
//! let base = BaseConfig::Value(json!({ "plugins": [] }));
//! let config = Composer::new(&ctx).compose(&base, None).unwrap();
//! println!("{}", serde_json::to_string_pretty(&config).unwrap());
//! ```
//!
//! ## Core Concepts
//!
//! - **Patterns (`pattern`)**: ordered glob groups evaluated first-match-wins.
//! - **Entries (`entry`)**: source files found by the asset groups, named by
//!   their location (`scripts/admin/admin-settings.js` becomes
//!   `scripts/admin-settings`).
//! - **Packages (`package`)**: sub-packages with their own `package.json`,
//!   bundled as libraries and declared as externals of everything else.
//! - **Project (`project`)**: the immutable context for one run, layering
//!   defaults, the manifest `"assetwire"` block, environment variables and
//!   explicit overrides.
//! - **Composition (`compose`, `merge`, `plugins`)**: the final configuration
//!   built from a caller-supplied base.
//! - **Package builds (`build`, `watch`)**: per-file transforms of package
//!   sources, once or continuously.

pub mod build;
pub mod compose;
pub mod defaults;
pub mod entry;
pub mod error;
pub mod merge;
pub mod output;
pub mod package;
pub mod pattern;
pub mod plugins;
pub mod project;
pub mod watch;

#[cfg(test)]
mod entry_proptest;
