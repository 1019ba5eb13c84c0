//! Markdown source discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extension that marks a Markdown source.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Lazy walk over every Markdown file below a root directory.
///
/// A missing root yields nothing. Symlinks are followed. Order is whatever
/// the file system reports and must not be relied on. Create a new value to
/// walk again.
pub struct MarkdownFiles {
    walker: Option<walkdir::IntoIter>,
}

impl MarkdownFiles {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();

        let walker = root
            .is_dir()
            .then(|| WalkDir::new(root).follow_links(true).into_iter());

        Self { walker }
    }
}

impl Iterator for MarkdownFiles {
    type Item = Result<PathBuf, walkdir::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let walker = self.walker.as_mut()?;

        for entry in walker.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };

            if entry.file_type().is_file() && is_markdown(entry.path()) {
                return Some(Ok(entry.into_path()));
            }
        }

        None
    }
}

/// Whether the file name ends with the Markdown extension.
pub fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(MARKDOWN_EXTENSION))
}
