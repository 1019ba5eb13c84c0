//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::services::ServeDir;

use quire_static::{BuildConfig, SiteBuilder};

use crate::rebuild::{debounce_rebuilds, Rebuild, RebuildGate};
use crate::watcher::{FileWatcher, WatchFilter};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Project root that is watched
    pub root: PathBuf,

    /// Config file whose changes trigger a rebuild
    pub config_file: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Rebuild when inputs change
    pub watch: bool,

    /// Quiet period after the last change before rebuilding
    pub debounce: Duration,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            config_file: PathBuf::from("book.toml"),
            port: 4000,
            host: "127.0.0.1".to_string(),
            watch: false,
            debounce: Duration::from_millis(500),
            open: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("Server error: {0}")]
    ServeError(String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Router serving the output directory at `/`.
pub fn router(output_dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(output_dir))
}

/// Development server.
///
/// `build` describes where sources and output live; it decides what is
/// served and watched. Every rebuild goes through `rebuilder`, which may
/// read its own configuration afresh.
pub struct DevServer<R = SiteBuilder> {
    config: DevServerConfig,
    build: BuildConfig,
    rebuilder: Arc<R>,
}

impl DevServer<SiteBuilder> {
    /// Serve a fixed build configuration.
    pub fn with_builder(config: DevServerConfig, builder: SiteBuilder) -> Self {
        let build = builder.config().clone();
        Self::new(config, build, builder)
    }
}

impl<R: Rebuild> DevServer<R> {
    /// Create a new development server.
    pub fn new(config: DevServerConfig, build: BuildConfig, rebuilder: R) -> Self {
        Self {
            config,
            build,
            rebuilder: Arc::new(rebuilder),
        }
    }

    pub fn config(&self) -> &DevServerConfig {
        &self.config
    }

    /// Build once, then serve the output until the process ends.
    pub async fn start(self) -> Result<(), ServerError> {
        let host_port = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = host_port
            .parse()
            .map_err(|_| ServerError::InvalidAddress(host_port.clone()))?;

        let gate = Arc::new(RebuildGate::new(Arc::clone(&self.rebuilder)));

        // Initial build. Failures are logged by the gate, not fatal.
        gate.trigger().await;

        // Dropping the watcher stops events, so keep it for the server's life.
        let _watcher = if self.config.watch {
            Some(self.watch(Arc::clone(&gate))?)
        } else {
            None
        };

        let output_dir = self.build.output_dir.clone();
        let app = router(&output_dir);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        tracing::info!("Development server running at http://{}", addr);
        tracing::info!("Serving from: {}", output_dir.display());
        if self.config.watch {
            tracing::info!("Watching for file changes...");
        }

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::warn!("Could not open browser: {}", e);
            }
        }

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        Ok(())
    }

    /// Start watching the project and feeding changes to the rebuild gate.
    fn watch(&self, gate: Arc<RebuildGate<R>>) -> Result<FileWatcher, ServerError> {
        let root = self
            .config
            .root
            .canonicalize()
            .map_err(|e| ServerError::WatchError(format!("{}: {}", self.config.root.display(), e)))?;

        let config_file = root.join(&self.config.config_file);
        let config_file = config_file.canonicalize().unwrap_or(config_file);

        let filter = WatchFilter::for_build(&root, &absolutize(&root, &self.build), &config_file)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let (mut watcher, events) =
            FileWatcher::new(&root, filter).map_err(|e| ServerError::WatchError(e.to_string()))?;

        // A config file outside the project is not covered by the root watch.
        if !config_file.starts_with(&root) {
            if let Some(dir) = config_file.parent().filter(|dir| dir.is_dir()) {
                watcher.add_dir(dir).map_err(|e| ServerError::WatchError(e.to_string()))?;
            }
        }

        tokio::spawn(debounce_rebuilds(events, gate, self.config.debounce));

        Ok(watcher)
    }
}

/// Resolve the watched directories against the canonical root so notify's
/// absolute paths line up with them.
fn absolutize(root: &Path, config: &BuildConfig) -> BuildConfig {
    let resolve = |dir: &Path| {
        if dir.is_absolute() {
            dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
        } else {
            root.join(dir)
        }
    };

    BuildConfig {
        source_dir: resolve(&config.source_dir),
        output_dir: resolve(&config.output_dir),
        layouts_dir: resolve(&config.layouts_dir),
        includes_dir: resolve(&config.includes_dir),
        assets_dir: resolve(&config.assets_dir),
        ..config.clone()
    }
}
