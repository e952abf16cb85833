//! checksync monitor - keeps a markdown task list in step with a task manager.
//!
//! This crate connects the [`checksync_engine`] to the outside world: it
//! watches a markdown document on disk, feeds every settled change to the
//! engine, persists the engine's rewrites atomically and forwards completion
//! changes to a task manager over HTTP.
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`watcher`]: File system watcher for the active document
//! - [`debounce`]: Coalescing of bursts of file system events
//! - [`store`]: Document store with atomic writes
//! - [`backend`]: HTTP task manager backend
//! - [`notifier`]: Log-backed user notifications
//! - [`daemon`]: Wiring between configuration, watcher and engine
//! - [`error`]: Error types for monitor operations

pub mod backend;
pub mod config;
pub mod daemon;
pub mod debounce;
pub mod error;
pub mod notifier;
pub mod store;
pub mod watcher;

pub use backend::HttpTaskBackend;
pub use config::{Config, ConfigError, DEFAULT_DEBOUNCE_MS};
pub use daemon::{build_engine, handle_document_event, init_logging};
pub use debounce::ChangeDebouncer;
pub use error::{MonitorError, Result};
pub use notifier::LogNotifier;
pub use store::FileDocument;
pub use watcher::{DocumentEvent, DocumentWatcher, WatcherError};
