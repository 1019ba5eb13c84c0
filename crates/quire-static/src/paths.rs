//! Source to output path mapping.

use std::path::{Path, PathBuf};

/// File name that a directory-style URL resolves to.
pub const INDEX_FILE: &str = "index.html";

/// Map a source path, relative to the source root, to its output path
/// relative to the output root.
///
/// `.md` becomes `.html`. `index` pages keep their place; every other page
/// `dir/name.md` becomes `dir/name/index.html` so it can be served at
/// `dir/name/`. Pure function: the file system is never consulted.
pub fn output_path(relative: &Path) -> PathBuf {
    let html = relative.with_extension("html");

    if html.file_name().and_then(|n| n.to_str()) == Some(INDEX_FILE) {
        return html;
    }

    let parent = html.parent().unwrap_or(Path::new(""));
    let stem = html.file_stem().unwrap_or_default();

    parent.join(stem).join(INDEX_FILE)
}

/// Site-relative URL path for an output path, e.g. `chapter01/intro/`.
pub fn url_path(output: &Path) -> String {
    let dir = output.parent().unwrap_or(Path::new(""));

    let segments: Vec<String> = dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}
