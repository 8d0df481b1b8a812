//! Batch transform of package sources.
//!
//! Every buildable package keeps its sources under `src/` and receives its
//! build output under `build/` with the same relative layout. Each source
//! file is handed to an external transform command as
//! `<command...> <source> <destination>`; the files are processed on a
//! fixed-size worker pool and one failure never stops the others.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Extensions transformed anywhere below `src/`.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "ts", "tsx", "json"];

/// Stylesheet extension; only top-level stylesheets are entry points.
const STYLE_EXTENSION: &str = "scss";

/// Decides which files under a package `src/` directory are build inputs.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include: Regex,
    excluded_dirs: Regex,
    excluded_files: Regex,
}

impl SourceFilter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            include: Regex::new(r"^/src/.+\.(js|json|scss|ts|tsx)$")?,
            excluded_dirs: Regex::new(r"/(benchmark|__mocks__|__tests__|test|storybook|stories)/.+")?,
            excluded_files: Regex::new(r"\.(spec|test)\.(js|ts|tsx)$")?,
        })
    }

    /// Whether `path` is a source file of the package at `root`.
    ///
    /// Only the part of `path` below `root` is inspected, so directories
    /// above the package never exclude its files.
    pub fn is_source_file(&self, root: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        let normalized = format!("/{}", relative.to_string_lossy().replace('\\', "/"));
        self.include.is_match(&normalized)
            && !self.excluded_dirs.is_match(&normalized)
            && !self.excluded_files.is_match(&normalized)
    }
}

/// Map `<pkg>/src/<rel>` to `<pkg>/build/<rel>`.
///
/// The last `src` component decides the split. Returns `None` for paths
/// without a `src` directory or with nothing after it.
pub fn build_path(source: &Path) -> Option<PathBuf> {
    let components: Vec<Component> = source.components().collect();
    let src_index = components
        .iter()
        .rposition(|c| matches!(c, Component::Normal(name) if *name == "src"))?;
    if src_index + 1 >= components.len() {
        return None;
    }

    let mut destination: PathBuf = components[..src_index].iter().collect();
    destination.push("build");
    destination.extend(&components[src_index + 1..]);
    Some(destination)
}

/// Collect every source file of the given packages, sorted.
pub fn collect_sources(roots: &[PathBuf], filter: &SourceFilter) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in roots {
        let src = root.join("src");
        if !src.is_dir() {
            debug!("Package {} has no src directory", root.display());
            continue;
        }

        for entry in WalkDir::new(&src).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let wanted = SCRIPT_EXTENSIONS.contains(&extension)
                || (extension == STYLE_EXTENSION && entry.depth() == 1);
            if wanted && filter.is_source_file(root, path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files
}

/// Top-level stylesheet entry points of one package, sorted.
pub fn stylesheet_entry_points(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root.join("src")) else {
        return Vec::new();
    };
    let mut styles: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == STYLE_EXTENSION))
        .collect();
    styles.sort();
    styles
}

/// Package root owning `file`: the deepest known root containing it, or the
/// nearest ancestor with a `package.json`.
fn owning_root(file: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .filter(|root| file.starts_with(root))
        .max_by_key(|root| root.components().count())
        .cloned()
        .or_else(|| {
            file.ancestors()
                .skip(1)
                .find(|dir| dir.join("package.json").is_file())
                .map(Path::to_path_buf)
        })
}

/// Replace explicitly requested stylesheets by their package's entry points.
///
/// Any partial may be imported by any entry point, so a changed `.scss`
/// file rebuilds all top-level stylesheets of its package, once per package.
pub fn expand_stylesheets(files: &[PathBuf], roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    let mut seen_packages: HashSet<PathBuf> = HashSet::new();

    for file in files {
        if file.extension().is_none_or(|e| e != STYLE_EXTENSION) {
            expanded.push(file.clone());
            continue;
        }
        let Some(root) = owning_root(file, roots) else {
            warn!("No package found for {}", file.display());
            continue;
        };
        if seen_packages.insert(root.clone()) {
            expanded.extend(stylesheet_entry_points(&root));
        }
    }

    expanded
}

/// Outcome of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Destination files written, sorted
    pub built: Vec<PathBuf>,
    /// Per-file failures, in completion order
    pub failures: Vec<Error>,
    /// Packages whose declaration step failed
    pub declaration_failures: Vec<PathBuf>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.declaration_failures.is_empty()
    }
}

/// Runs package transforms on a worker pool.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    command: Vec<String>,
    declaration_command: Option<Vec<String>>,
    envs: Vec<(String, String)>,
    jobs: usize,
    progress: bool,
}

impl BatchBuilder {
    /// Create a builder running `command` (program followed by its leading
    /// arguments) once per source file.
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            declaration_command: None,
            envs: Vec::new(),
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            progress: false,
        }
    }

    /// Command run as `<command...> --project <tsconfig>` for every package
    /// with a `tsconfig.json` once the pool has drained.
    pub fn declaration_command(mut self, command: Option<Vec<String>>) -> Self {
        self.declaration_command = command.filter(|c| !c.is_empty());
        self
    }

    /// Set an environment variable for every transform process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Transform `files` and then run the declaration step for `roots`.
    pub fn run(&self, files: &[PathBuf], roots: &[PathBuf]) -> Result<BatchReport> {
        let Some((program, leading)) = self.command.split_first() else {
            return Err(Error::Transform {
                path: PathBuf::new(),
                message: "no transform command configured".to_string(),
            });
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        let bar = self.progress_bar(files.len() as u64);
        let built: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());
        let failures: Mutex<Vec<Error>> = Mutex::new(Vec::new());

        info!("Building {} file(s) with {} worker(s)", files.len(), self.jobs);
        pool.install(|| {
            files.par_iter().for_each(|file| {
                match transform_file(program, leading, &self.envs, file) {
                    Ok(destination) => {
                        debug!("{} -> {}", file.display(), destination.display());
                        built.lock().unwrap().push(destination);
                    }
                    Err(e) => {
                        error!("{}", e);
                        failures.lock().unwrap().push(e);
                    }
                }
                if let Some(bar) = &bar {
                    bar.inc(1);
                }
            });
        });
        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        let mut built = built.into_inner().unwrap_or_default();
        built.sort();
        let mut report = BatchReport {
            built,
            failures: failures.into_inner().unwrap_or_default(),
            declaration_failures: Vec::new(),
        };

        if let Some(command) = &self.declaration_command {
            report.declaration_failures = build_declarations(command, roots);
        }

        Ok(report)
    }

    fn progress_bar(&self, total: u64) -> Option<ProgressBar> {
        if !self.progress || total == 0 {
            return None;
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("Build Progress: [{bar:30.cyan/blue}] {percent}%")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Some(bar)
    }
}

fn transform_file(
    program: &str,
    leading: &[String],
    envs: &[(String, String)],
    file: &Path,
) -> Result<PathBuf> {
    let destination = build_path(file).ok_or_else(|| Error::Transform {
        path: file.to_path_buf(),
        message: "file is not inside a package src directory".to_string(),
    })?;
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let output = Command::new(program)
        .args(leading)
        .envs(envs.iter().map(|(k, v)| (k, v)))
        .arg(file)
        .arg(&destination)
        .output()
        .map_err(|e| Error::Transform {
            path: file.to_path_buf(),
            message: format!("failed to run '{}': {}", program, e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::Transform {
            path: file.to_path_buf(),
            message: if stderr.is_empty() {
                format!("'{}' exited with {}", program, output.status)
            } else {
                stderr
            },
        });
    }

    Ok(destination)
}

/// Run the declaration command for every package with a `tsconfig.json`.
///
/// Returns the packages whose run failed.
fn build_declarations(command: &[String], roots: &[PathBuf]) -> Vec<PathBuf> {
    let typed: Vec<&PathBuf> = roots
        .iter()
        .filter(|root| root.join("tsconfig.json").is_file())
        .collect();
    if typed.is_empty() {
        return Vec::new();
    }

    info!("Generating type declarations for {} package(s)", typed.len());
    let mut failed = Vec::new();
    for root in typed {
        let status = Command::new(&command[0])
            .args(&command[1..])
            .arg("--project")
            .arg(root.join("tsconfig.json"))
            .status();
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                error!("Failed to generate types for {} ({})", root.display(), status);
                failed.push(root.clone());
            }
            Err(e) => {
                error!("Failed to generate types for {}: {}", root.display(), e);
                failed.push(root.clone());
            }
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_build_path_mapping() {
        assert_eq!(
            build_path(Path::new("/p/packages/blocks/src/edit/index.js")),
            Some(PathBuf::from("/p/packages/blocks/build/edit/index.js"))
        );
    }

    #[test]
    fn test_build_path_uses_last_src() {
        assert_eq!(
            build_path(Path::new("/src/packages/a/src/index.ts")),
            Some(PathBuf::from("/src/packages/a/build/index.ts"))
        );
    }

    #[test]
    fn test_build_path_outside_src() {
        assert_eq!(build_path(Path::new("/p/packages/a/index.js")), None);
        assert_eq!(build_path(Path::new("/p/packages/a/src")), None);
    }

    #[test]
    fn test_source_filter() {
        let filter = SourceFilter::new().unwrap();
        let root = Path::new("/p/a");
        assert!(filter.is_source_file(root, Path::new("/p/a/src/index.js")));
        assert!(filter.is_source_file(root, Path::new("/p/a/src/style.scss")));
        assert!(!filter.is_source_file(root, Path::new("/p/a/src/index.test.js")));
        assert!(!filter.is_source_file(root, Path::new("/p/a/src/__tests__/index.js")));
        assert!(!filter.is_source_file(root, Path::new("/p/a/src/stories/button.tsx")));
        assert!(!filter.is_source_file(root, Path::new("/p/a/src/readme.md")));
        assert!(!filter.is_source_file(root, Path::new("/p/a/index.js")));
        assert!(!filter.is_source_file(root, Path::new("/p/b/src/index.js")));
    }

    #[test]
    fn test_source_filter_ignores_directories_above_package() {
        let filter = SourceFilter::new().unwrap();
        let root = Path::new("/home/test/stories/packages/a");
        assert!(filter.is_source_file(
            root,
            Path::new("/home/test/stories/packages/a/src/index.js")
        ));
        assert!(!filter.is_source_file(
            root,
            Path::new("/home/test/stories/packages/a/src/test/index.js")
        ));
    }

    #[test]
    fn test_collect_sources_under_excluded_directory_name() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("test/myplugin/packages/blocks");
        let index = touch(&root, "src/index.js");
        touch(&root, "src/__mocks__/api.js");

        let files = collect_sources(&[root], &SourceFilter::new().unwrap());
        assert_eq!(files, vec![index]);
    }

    #[test]
    fn test_collect_sources() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("packages/blocks");
        touch(&root, "src/index.js");
        touch(&root, "src/edit/edit.tsx");
        touch(&root, "src/block.json");
        touch(&root, "src/style.scss");
        touch(&root, "src/components/_button.scss");
        touch(&root, "src/edit/edit.spec.tsx");
        touch(&root, "src/test/helpers.js");
        touch(&root, "README.md");

        let files = collect_sources(&[root.clone()], &SourceFilter::new().unwrap());
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(&root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("src/block.json"),
                PathBuf::from("src/edit/edit.tsx"),
                PathBuf::from("src/index.js"),
                PathBuf::from("src/style.scss"),
            ]
        );
    }

    #[test]
    fn test_expand_stylesheets_once_per_package() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("packages/blocks");
        touch(&root, "package.json");
        let editor = touch(&root, "src/editor.scss");
        let style = touch(&root, "src/style.scss");
        let partial = touch(&root, "src/components/_button.scss");
        let script = touch(&root, "src/index.js");

        let files = vec![partial, script.clone(), style.clone()];
        let expanded = expand_stylesheets(&files, &[root.clone()]);

        assert_eq!(expanded, vec![editor, style, script]);
    }

    #[test]
    fn test_expand_stylesheets_finds_unlisted_root() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("packages/icons");
        touch(&root, "package.json");
        let style = touch(&root, "src/style.scss");

        let expanded = expand_stylesheets(&[style.clone()], &[]);
        assert_eq!(expanded, vec![style]);
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_runs_command_per_file() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("packages/blocks");
        let a = touch(&root, "src/a.js");
        let b = touch(&root, "src/nested/b.js");

        let builder = BatchBuilder::new(vec!["cp".to_string()]).jobs(2);
        let report = builder.run(&[a, b], &[root.clone()]).unwrap();

        assert!(report.is_success());
        assert_eq!(
            report.built,
            vec![root.join("build/a.js"), root.join("build/nested/b.js")]
        );
        assert!(root.join("build/nested/b.js").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_failure_does_not_stop_siblings() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("packages/blocks");
        let good = touch(&root, "src/good.js");
        let missing = root.join("src/missing.js");

        let builder = BatchBuilder::new(vec!["cp".to_string()]).jobs(1);
        let report = builder.run(&[missing, good], &[root.clone()]).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], Error::Transform { .. }));
        assert_eq!(report.built, vec![root.join("build/good.js")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_transform_receives_environment() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("packages/blocks");
        let file = touch(&root, "src/index.js");

        let builder = BatchBuilder::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf %s \"$NODE_ENV\" > \"$2\"".to_string(),
            "transform".to_string(),
        ])
        .env("NODE_ENV", "production");
        let report = builder.run(&[file], &[]).unwrap();

        assert!(report.is_success());
        assert_eq!(fs::read_to_string(root.join("build/index.js")).unwrap(), "production");
    }

    #[cfg(unix)]
    #[test]
    fn test_declaration_step_reports_failures() {
        let temp = tempdir().unwrap();
        let typed = temp.path().join("packages/typed");
        touch(&typed, "tsconfig.json");
        let untyped = temp.path().join("packages/plain");

        let builder = BatchBuilder::new(vec!["cp".to_string()])
            .declaration_command(Some(vec!["false".to_string()]));
        let report = builder.run(&[], &[typed.clone(), untyped]).unwrap();

        assert_eq!(report.declaration_failures, vec![typed]);
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let result = BatchBuilder::new(Vec::new()).run(&[], &[]);
        assert!(matches!(result, Err(Error::Transform { .. })));
    }
}
