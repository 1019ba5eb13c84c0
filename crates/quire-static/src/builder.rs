//! Static site builder.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use quire_md::Page;

use crate::assets::{copy_dir, copy_static_files, empty_dir};
use crate::discover::MarkdownFiles;
use crate::layout::Layouts;
use crate::paths::{output_path, url_path};
use crate::site::SiteConfig;

/// Configuration for building a book.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Markdown sources
    pub source_dir: PathBuf,

    /// Output directory, emptied on every build
    pub output_dir: PathBuf,

    /// External layouts, looked up as `<name>.html`
    pub layouts_dir: PathBuf,

    /// Layout includes; only watched, never read by the build
    pub includes_dir: PathBuf,

    /// Asset tree copied to `<output>/assets`
    pub assets_dir: PathBuf,

    /// Directory holding the static files below
    pub static_root: PathBuf,

    /// Root-level files copied as is when present (hosting metadata etc.)
    pub static_files: Vec<String>,

    /// Site metadata
    pub site: SiteConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("docs"),
            output_dir: PathBuf::from("dist"),
            layouts_dir: PathBuf::from("_layouts"),
            includes_dir: PathBuf::from("_includes"),
            assets_dir: PathBuf::from("assets"),
            static_root: PathBuf::from("."),
            static_files: default_static_files(),
            site: SiteConfig::default(),
        }
    }
}

/// Files copied from the static root by default.
pub fn default_static_files() -> Vec<String> {
    vec![
        "CNAME".to_string(),
        "robots.txt".to_string(),
        ".nojekyll".to_string(),
    ]
}

/// Result of a build operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Number of pages generated (files copied in verbatim mode)
    pub pages: usize,

    /// Number of asset files copied
    pub assets: usize,

    /// Number of allowlisted static files copied
    pub static_files: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read sources: {0}")]
    ReadError(String),

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error("Failed to copy files: {0}")]
    CopyError(String),
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
    layouts: Layouts,
}

impl SiteBuilder {
    /// Create a new builder.
    pub fn new(config: BuildConfig) -> Self {
        let layouts = Layouts::new(&config.layouts_dir);
        Self { config, layouts }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the site.
    ///
    /// The output directory is emptied first, so the result depends only on
    /// the inputs. Any page, write or copy failure aborts the build.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let output_dir = &self.config.output_dir;

        empty_dir(output_dir).map_err(|e| {
            BuildError::WriteError(format!("{}: {}", output_dir.display(), e))
        })?;

        let assets = self.copy_assets()?;

        let sources = self.resolve_collisions(self.discover_sources()?);

        sources
            .par_iter()
            .try_for_each(|source| self.build_page(source))?;

        tracing::info!("Processed {} markdown files", sources.len());

        let static_files = copy_static_files(
            &self.config.static_root,
            &self.config.static_files,
            output_dir,
        )
        .map_err(|e| BuildError::CopyError(e.to_string()))?;

        Ok(BuildResult {
            pages: sources.len(),
            assets,
            static_files,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: output_dir.clone(),
        })
    }

    /// Copy the sources into the output unrendered, plus assets.
    ///
    /// Fallback mode for hosts that render Markdown themselves.
    pub fn build_verbatim(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let output_dir = &self.config.output_dir;

        empty_dir(output_dir).map_err(|e| {
            BuildError::WriteError(format!("{}: {}", output_dir.display(), e))
        })?;

        let pages = if self.config.source_dir.is_dir() {
            copy_dir(&self.config.source_dir, output_dir)
                .map_err(|e| BuildError::CopyError(e.to_string()))?
        } else {
            tracing::info!(
                "No source directory at {}, skipping",
                self.config.source_dir.display()
            );
            0
        };

        let assets = self.copy_assets()?;

        Ok(BuildResult {
            pages,
            assets,
            static_files: 0,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: output_dir.clone(),
        })
    }

    fn copy_assets(&self) -> Result<usize, BuildError> {
        let assets_dir = &self.config.assets_dir;

        if !assets_dir.is_dir() {
            tracing::debug!("No assets directory at {}", assets_dir.display());
            return Ok(0);
        }

        let copied = copy_dir(assets_dir, &self.config.output_dir.join("assets"))
            .map_err(|e| BuildError::CopyError(format!("{}: {}", assets_dir.display(), e)))?;

        tracing::info!("Copied {} asset files", copied);
        Ok(copied)
    }

    /// Find all Markdown sources.
    fn discover_sources(&self) -> Result<Vec<PathBuf>, BuildError> {
        MarkdownFiles::new(&self.config.source_dir)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BuildError::ReadError(e.to_string()))
    }

    fn relative_source<'a>(&self, source: &'a Path) -> &'a Path {
        source
            .strip_prefix(&self.config.source_dir)
            .unwrap_or(source)
    }

    /// Two sources mapping to one output would overwrite each other. Keep
    /// the last one in path order so the result does not depend on the walk.
    fn resolve_collisions(&self, mut sources: Vec<PathBuf>) -> Vec<PathBuf> {
        sources.sort();

        let mut kept: HashMap<PathBuf, usize> = HashMap::new();
        for (i, source) in sources.iter().enumerate() {
            let output = output_path(self.relative_source(source));
            if let Some(previous) = kept.insert(output.clone(), i) {
                tracing::warn!(
                    "{} and {} both map to {}; only {} will be kept",
                    sources[previous].display(),
                    source.display(),
                    output.display(),
                    source.display()
                );
            }
        }

        let mut winners: Vec<usize> = kept.into_values().collect();
        winners.sort_unstable();
        winners.into_iter().map(|i| sources[i].clone()).collect()
    }

    /// Build a single page.
    fn build_page(&self, source: &Path) -> Result<(), BuildError> {
        let content = fs::read_to_string(source)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", source.display(), e)))?;

        let page = Page::parse(source, &content).map_err(|e| BuildError::ParseError {
            path: source.display().to_string(),
            message: e.to_string(),
        })?;

        let html = self.layouts.render(
            &page.html,
            &page.front_matter,
            page.source_path(),
            &self.config.site,
        );

        let relative = output_path(self.relative_source(source));
        let target = self.config.output_dir.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", parent.display(), e)))?;
        }

        fs::write(&target, html)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", target.display(), e)))?;

        tracing::debug!("{} -> /{}", source.display(), url_path(&relative));
        Ok(())
    }
}
