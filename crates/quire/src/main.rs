//! quire CLI - static site generator for Markdown books.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use commands::escape::Style;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Static site generator for Markdown books")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to book.toml config file
    #[arg(short, long, global = true, default_value = "book.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Copy pages verbatim instead of rendering them
        #[arg(long)]
        verbatim: bool,
    },

    /// Build, then serve the output directory
    Serve {
        /// Port to listen on (defaults to config or 4000)
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to (defaults to config or 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Rebuild when sources change
        #[arg(short, long)]
        watch: bool,

        /// Open browser once the server is up
        #[arg(long)]
        open: bool,
    },

    /// Escape Liquid delimiters inside code in source pages
    EscapeLiquid {
        /// How code is escaped
        #[arg(short, long, value_enum, default_value_t = Style::Backslash)]
        style: Style,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Build { output, verbatim } => {
            commands::build::run(&cli.config, output, verbatim)?;
        }
        Commands::Serve {
            port,
            host,
            watch,
            open,
        } => {
            commands::serve::run(&cli.config, port, host, watch, open).await?;
        }
        Commands::EscapeLiquid { style, dry_run } => {
            commands::escape::run(&cli.config, style, dry_run)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from(["quire", "serve", "--port", "8080", "--watch"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("book.toml"));
        match cli.command {
            Commands::Serve { port, watch, open, .. } => {
                assert_eq!(port, Some(8080));
                assert!(watch);
                assert!(!open);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parses_escape_style() {
        let cli = Cli::try_parse_from([
            "quire",
            "--config",
            "guide.toml",
            "escape-liquid",
            "--style",
            "raw",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("guide.toml"));
        match cli.command {
            Commands::EscapeLiquid { style, dry_run } => {
                assert_eq!(style, Style::Raw);
                assert!(dry_run);
            }
            _ => panic!("expected escape-liquid"),
        }
    }
}
