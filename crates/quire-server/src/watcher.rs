//! File watching for rebuild-on-change.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern, PatternError};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use quire_static::BuildConfig;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File was created
    Added(PathBuf),

    /// File contents or metadata changed
    Changed(PathBuf),

    /// File was deleted
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Added(path) | Self::Changed(path) | Self::Removed(path) => path,
        }
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Decides which paths below a project root are worth a rebuild.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl WatchFilter {
    /// Create a filter from glob patterns relative to `root`.
    pub fn new<S: AsRef<str>>(
        root: impl Into<PathBuf>,
        include: &[S],
        exclude: &[S],
    ) -> Result<Self, PatternError> {
        let compile = |patterns: &[S]| {
            patterns
                .iter()
                .map(|p| Pattern::new(p.as_ref()))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            root: root.into(),
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// The watch set of a book: sources, layouts, includes, assets and the
    /// config file, ignoring the output and `node_modules`.
    pub fn for_build(
        root: impl Into<PathBuf>,
        config: &BuildConfig,
        config_file: &Path,
    ) -> Result<Self, PatternError> {
        let root = root.into();

        let include = vec![
            dir_pattern(&root, &config.source_dir, "**/*.md"),
            dir_pattern(&root, &config.layouts_dir, "**/*.html"),
            dir_pattern(&root, &config.includes_dir, "**/*.html"),
            dir_pattern(&root, &config.assets_dir, "**/*"),
            Pattern::escape(&relative_display(&root, config_file)),
        ];
        let exclude = vec![
            "node_modules/**/*".to_string(),
            dir_pattern(&root, &config.output_dir, "**/*"),
        ];

        Self::new(root, include.as_slice(), exclude.as_slice())
    }

    /// Whether a change at `path` (absolute or relative to the root) should
    /// trigger a rebuild.
    pub fn matches(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        if self
            .exclude
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
        {
            return false;
        }

        self.include
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }
}

/// Path relative to the root with forward slashes and no leading `./`.
/// Paths outside the root stay absolute.
fn relative_display(root: &Path, path: &Path) -> String {
    let path = path.strip_prefix(root).unwrap_or(path);
    if path.is_absolute() {
        return path.to_string_lossy().into_owned();
    }
    let path = path.strip_prefix(".").unwrap_or(path);

    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn dir_pattern(root: &Path, dir: &Path, tail: &str) -> String {
    let dir = relative_display(root, dir);
    if dir.is_empty() {
        tail.to_string()
    } else {
        format!("{}/{}", Pattern::escape(&dir), tail)
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `root` recursively, forwarding events whose path passes the
    /// filter.
    ///
    /// Returns the watcher and a channel to receive events. Events stop when
    /// the watcher is dropped.
    pub fn new(
        root: &Path,
        filter: WatchFilter,
    ) -> Result<(Self, UnboundedReceiver<WatchEvent>), notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for path in &event.paths {
                        if !filter.matches(path) {
                            continue;
                        }
                        if let Some(watch_event) = classify_event(path, &event.kind) {
                            let _ = tx.send(watch_event);
                        }
                    }
                }
                Err(e) => tracing::warn!("Watch error: {}", e),
            }
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok((Self { watcher }, rx))
    }

    /// Also watch the files directly inside `dir`, e.g. a config file kept
    /// outside the root. Events still go through the filter.
    pub fn add_dir(&mut self, dir: &Path) -> Result<(), notify::Error> {
        self.watcher.watch(dir, RecursiveMode::NonRecursive)
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &EventKind) -> Option<WatchEvent> {
    match kind {
        EventKind::Create(_) => Some(WatchEvent::Added(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        EventKind::Modify(_) => Some(WatchEvent::Changed(path.to_path_buf())),
        _ => None,
    }
}
