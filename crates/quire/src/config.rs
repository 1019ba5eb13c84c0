//! Configuration file (book.toml).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use quire_static::{default_static_files, BuildConfig, SiteConfig};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub serve: ServeSettings,
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_layouts")]
    pub layouts: String,
    #[serde(default = "default_includes")]
    pub includes: String,
    #[serde(default = "default_assets")]
    pub assets: String,
    /// Root-level files copied into the output when present
    #[serde(default = "default_static_files")]
    pub static_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServeSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_source() -> String {
    "docs".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_layouts() -> String {
    "_layouts".to_string()
}
fn default_includes() -> String {
    "_includes".to_string()
}
fn default_assets() -> String {
    "assets".to_string()
}
fn default_port() -> u16 {
    4000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_debounce_ms() -> u64 {
    500
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            layouts: default_layouts(),
            includes: default_includes(),
            assets: default_assets(),
            static_files: default_static_files(),
        }
    }
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl ConfigFile {
    /// Builder configuration; directories are relative to the working directory.
    pub fn build_config(&self, output: Option<PathBuf>) -> BuildConfig {
        BuildConfig {
            source_dir: PathBuf::from(&self.build.source),
            output_dir: output.unwrap_or_else(|| PathBuf::from(&self.build.output)),
            layouts_dir: PathBuf::from(&self.build.layouts),
            includes_dir: PathBuf::from(&self.build.includes),
            assets_dir: PathBuf::from(&self.build.assets),
            static_root: PathBuf::from("."),
            static_files: self.build.static_files.clone(),
            site: self.site.clone(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.serve.debounce_ms)
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {}, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("book.toml")).unwrap();
        let build = config.build_config(None);

        assert_eq!(build.source_dir, PathBuf::from("docs"));
        assert_eq!(build.output_dir, PathBuf::from("dist"));
        assert_eq!(build.layouts_dir, PathBuf::from("_layouts"));
        assert_eq!(build.static_files, vec!["CNAME", "robots.txt", ".nojekyll"]);
        assert_eq!(build.site, SiteConfig::default());
        assert_eq!(config.serve.port, 4000);
        assert_eq!(config.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn reads_site_and_overrides() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("book.toml");
        fs::write(
            &path,
            r#"
[site]
title = "Podman Guide"
description = "Containers in practice"
url = "https://example.github.io"
baseurl = "/podman-book"
author = "Example Press"

[build]
output = "public"

[serve]
port = 8080
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let build = config.build_config(None);

        assert_eq!(build.site.title, "Podman Guide");
        assert_eq!(build.site.baseurl, "/podman-book");
        assert_eq!(build.site.author, "Example Press");
        assert_eq!(build.site.repository, None);
        assert_eq!(build.source_dir, PathBuf::from("docs"));
        assert_eq!(build.output_dir, PathBuf::from("public"));
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.host, "127.0.0.1");
    }

    #[test]
    fn output_flag_wins() {
        let config = ConfigFile::default();

        let build = config.build_config(Some(PathBuf::from("out")));

        assert_eq!(build.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("book.toml");
        fs::write(&path, "[site\ntitle = ").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }
}
