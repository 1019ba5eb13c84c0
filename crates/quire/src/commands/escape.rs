//! Escape Liquid delimiters in code samples of every source page.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use quire_md::{escape_liquid, EscapeStyle};
use quire_static::MarkdownFiles;

use crate::config::load_config;

/// Escape style as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    /// Prefix braces with backslashes
    Backslash,
    /// Wrap code in {% raw %} tags
    Raw,
}

impl From<Style> for EscapeStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Backslash => EscapeStyle::Backslash,
            Style::Raw => EscapeStyle::Raw,
        }
    }
}

/// Run the escape-liquid command.
pub fn run(config_path: &Path, style: Style, dry_run: bool) -> Result<()> {
    let file_config = load_config(config_path)?;
    let source_dir = PathBuf::from(&file_config.build.source);

    let fixed = escape_dir(&source_dir, style.into(), dry_run)?;

    for (path, fixes) in &fixed {
        let relative = path.strip_prefix(&source_dir).unwrap_or(path);
        tracing::info!("Fixed {} issues in: {}", fixes, relative.display());
    }

    let total: usize = fixed.iter().map(|(_, fixes)| fixes).sum();
    if dry_run {
        tracing::info!(
            "Would fix {} Liquid syntax issues in {} files",
            total,
            fixed.len()
        );
    } else {
        tracing::info!("Fixed {} Liquid syntax issues in {} files", total, fixed.len());
    }

    Ok(())
}

/// Rewrite every page below `dir`, skipping hidden directories and
/// `node_modules`. Returns the files that needed changes with their fix count.
pub fn escape_dir(dir: &Path, style: EscapeStyle, dry_run: bool) -> Result<Vec<(PathBuf, usize)>> {
    let mut fixed = Vec::new();

    for path in MarkdownFiles::new(dir) {
        let path = path.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if is_skipped(path.strip_prefix(dir).unwrap_or(&path)) {
            continue;
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let escaped = escape_liquid(&content, style);

        if !escaped.changed() {
            continue;
        }

        if !dry_run {
            fs::write(&path, &escaped.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        fixed.push((path, escaped.fixes));
    }

    fixed.sort();
    Ok(fixed)
}

fn is_skipped(relative: &Path) -> bool {
    let Some(parent) = relative.parent() else {
        return false;
    };

    parent.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || name == "node_modules"
        }
        _ => false,
    })
}
