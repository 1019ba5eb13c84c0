//! Development server for quire books.
//!
//! Serves the built output over HTTP and, in watch mode, rebuilds when
//! sources, layouts, assets or the config file change.

pub mod rebuild;
pub mod server;
pub mod watcher;

pub use rebuild::{debounce_rebuilds, Rebuild, RebuildGate, Trigger};
pub use server::{router, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent, WatchFilter};
