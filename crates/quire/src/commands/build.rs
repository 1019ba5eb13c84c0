//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use quire_static::SiteBuilder;

use crate::config::load_config;

/// Run the build command.
pub fn run(config_path: &Path, output: Option<PathBuf>, verbatim: bool) -> Result<()> {
    tracing::info!("Building static site...");

    let file_config = load_config(config_path)?;
    let builder = SiteBuilder::new(file_config.build_config(output));

    let result = if verbatim {
        builder.build_verbatim()?
    } else {
        builder.build()?
    };

    tracing::info!(
        "Built {} pages, {} assets and {} static files in {}ms",
        result.pages,
        result.assets,
        result.static_files,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    let site = &builder.config().site;
    if !site.url.is_empty() {
        tracing::info!("Publishes to {}", site.absolute_url());
    }

    Ok(())
}
