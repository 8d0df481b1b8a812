//! Package source watcher with debounced rebuild batches.
//!
//! Change events for package sources are collected in a [`RebuildQueue`].
//! The queue releases its files as one batch once no new change arrived for
//! the quiet period, and never while a previous batch is still rebuilding.
//! Removing a source file deletes its build counterpart immediately.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::build::{SourceFilter, build_path};
use crate::error::Result;

/// How often pending changes are checked.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Time without new changes before a batch is released.
pub const QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Pending rebuilds, coalesced and debounced.
#[derive(Debug)]
pub struct RebuildQueue {
    pending: BTreeSet<PathBuf>,
    last_change: Option<Instant>,
    quiet: Duration,
    in_flight: bool,
}

impl RebuildQueue {
    pub fn new(quiet: Duration) -> Self {
        Self {
            pending: BTreeSet::new(),
            last_change: None,
            quiet,
            in_flight: false,
        }
    }

    /// Record a changed file.
    pub fn push(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path);
        self.last_change = Some(now);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Release the pending files if the queue is quiet and idle.
    ///
    /// A released batch marks the queue in flight until [`finish`] is called.
    ///
    /// [`finish`]: RebuildQueue::finish
    pub fn take_ready(&mut self, now: Instant) -> Option<Vec<PathBuf>> {
        if self.in_flight || self.pending.is_empty() {
            return None;
        }
        let last = self.last_change?;
        if now.saturating_duration_since(last) < self.quiet {
            return None;
        }
        self.in_flight = true;
        Some(std::mem::take(&mut self.pending).into_iter().collect())
    }

    /// Mark the current batch as done.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }
}

impl Default for RebuildQueue {
    fn default() -> Self {
        Self::new(QUIET_PERIOD)
    }
}

/// What a file event means for the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// A source file was created or modified
    Changed(PathBuf),
    /// A source file was removed
    Removed(PathBuf),
}

/// Event filtering and queueing, independent of the OS watcher.
#[derive(Debug)]
pub struct WatchState {
    roots: Vec<PathBuf>,
    filter: SourceFilter,
    queue: RebuildQueue,
}

impl WatchState {
    pub fn new(roots: Vec<PathBuf>, filter: SourceFilter, queue: RebuildQueue) -> Self {
        Self {
            roots,
            filter,
            queue,
        }
    }

    pub fn queue(&self) -> &RebuildQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut RebuildQueue {
        &mut self.queue
    }

    fn is_watched(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| self.filter.is_source_file(root, path))
    }

    /// Translate an OS event into build changes for known package sources.
    pub fn classify(&self, event: &Event) -> Vec<FileChange> {
        let removed = match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => false,
            EventKind::Remove(_) => true,
            _ => return Vec::new(),
        };
        event
            .paths
            .iter()
            .filter(|path| self.is_watched(path))
            .filter_map(|path| {
                if removed {
                    Some(FileChange::Removed(path.clone()))
                } else if path.is_file() {
                    Some(FileChange::Changed(path.clone()))
                } else {
                    // Renamed away or already deleted again.
                    None
                }
            })
            .collect()
    }

    /// Apply one OS event: queue changes and delete stale build files.
    pub fn handle_event(&mut self, event: &Event, now: Instant) {
        for change in self.classify(event) {
            match change {
                FileChange::Changed(path) => {
                    info!("-> changed: {}", path.display());
                    self.queue.push(path, now);
                }
                FileChange::Removed(path) => remove_build_file(&path),
            }
        }
    }
}

fn remove_build_file(source: &Path) {
    let Some(build_file) = build_path(source) else {
        return;
    };
    if !build_file.is_file() {
        return;
    }
    match fs::remove_file(&build_file) {
        Ok(()) => info!("<- removed: {}", source.display()),
        Err(e) => warn!("Unable to remove build file {}: {}", build_file.display(), e),
    }
}

/// Recursive OS watcher over the `src` directories of a set of packages.
pub struct PackageWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    state: WatchState,
}

impl PackageWatcher {
    /// Start watching every existing `<root>/src` directory.
    pub fn new(roots: Vec<PathBuf>) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // The receiver is gone once the watch loop ended.
            let _ = tx.send(res);
        })?;

        for root in &roots {
            let src = root.join("src");
            if src.is_dir() {
                debug!("Watching {}", src.display());
                watcher.watch(&src, RecursiveMode::Recursive)?;
            }
        }

        Ok(Self {
            _watcher: watcher,
            events: rx,
            state: WatchState::new(roots, SourceFilter::new()?, RebuildQueue::default()),
        })
    }

    /// Run until the watcher shuts down, calling `rebuild` with each batch.
    ///
    /// A failing rebuild is logged and the loop keeps going.
    pub fn run<F>(&mut self, mut rebuild: F) -> Result<()>
    where
        F: FnMut(Vec<PathBuf>) -> Result<()>,
    {
        info!("Watching for changes...");
        loop {
            match self.events.recv_timeout(FLUSH_INTERVAL) {
                Ok(Ok(event)) => self.state.handle_event(&event, Instant::now()),
                Ok(Err(e)) => warn!("Watch error: {}", e),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }

            if let Some(batch) = self.state.queue_mut().take_ready(Instant::now()) {
                debug!("Rebuilding {} file(s)", batch.len());
                if let Err(e) = rebuild(batch) {
                    warn!("Rebuild failed: {}", e);
                }
                self.state.queue_mut().finish();
            }
        }
    }
}
