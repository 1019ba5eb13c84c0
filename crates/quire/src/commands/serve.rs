//! Development server command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use quire_server::{DevServer, DevServerConfig, Rebuild};
use quire_static::SiteBuilder;

use crate::config::load_config;

/// Rebuilds from the config file as it is on disk at the time of the build,
/// so edits to it take effect without restarting the server.
pub struct ReloadingBuild {
    config_path: PathBuf,
}

impl ReloadingBuild {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }
}

impl Rebuild for ReloadingBuild {
    type Error = anyhow::Error;

    fn rebuild(&self) -> Result<()> {
        let file_config = load_config(&self.config_path)?;
        let result = SiteBuilder::new(file_config.build_config(None)).build()?;

        tracing::info!(
            "Rebuilt {} pages in {}ms",
            result.pages,
            result.duration_ms
        );
        Ok(())
    }
}

/// Run the dev server.
pub async fn run(
    config_path: &Path,
    port: Option<u16>,
    host: Option<String>,
    watch: bool,
    open: bool,
) -> Result<()> {
    let file_config = load_config(config_path)?;

    let config = DevServerConfig {
        root: PathBuf::from("."),
        config_file: config_path.to_path_buf(),
        port: port.unwrap_or(file_config.serve.port),
        host: host.unwrap_or_else(|| file_config.serve.host.clone()),
        watch,
        debounce: file_config.debounce(),
        open,
    };

    tracing::info!("Starting development server on port {}", config.port);

    DevServer::new(
        config,
        file_config.build_config(None),
        ReloadingBuild::new(config_path),
    )
    .start()
    .await?;

    Ok(())
}
