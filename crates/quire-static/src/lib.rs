//! Static site builder for quire books.
//!
//! Turns a tree of Markdown sources into a directory of pretty-URL HTML
//! pages, wrapped in a layout, next to copied assets and hosting files.

pub mod assets;
pub mod builder;
pub mod discover;
pub mod layout;
pub mod paths;
pub mod site;

pub use builder::{default_static_files, BuildConfig, BuildError, BuildResult, SiteBuilder};
pub use discover::MarkdownFiles;
pub use layout::{apply_template, Layouts};
pub use paths::output_path;
pub use site::SiteConfig;
