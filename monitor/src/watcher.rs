//! File watcher for the active markdown document.
//!
//! # Architecture
//!
//! The watcher uses the [`notify`] crate on the document's parent directory
//! (non-recursive), because editors and atomic writers replace the file by
//! renaming a temporary file over it, which a watch on the file itself would
//! lose. Events for other files in the directory are dropped.
//!
//! The notify callback is kept lightweight: it only forwards a signal to a
//! [`ChangeDebouncer`]. Once a burst settles, an async task reads the whole
//! document and emits a [`DocumentEvent`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use checksync_monitor::watcher::{DocumentEvent, DocumentWatcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = mpsc::channel(16);
//!     let _watcher = DocumentWatcher::new(
//!         PathBuf::from("/notes/today.md"),
//!         Duration::from_millis(100),
//!         tx,
//!     )?;
//!
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             DocumentEvent::Changed(content) => println!("{} bytes", content.len()),
//!             DocumentEvent::Removed(path) => println!("Removed: {:?}", path),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{event::ModifyKind, Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::debounce::ChangeDebouncer;

/// Events emitted by the document watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The document changed; carries its full content after the change.
    Changed(String),

    /// The document no longer exists.
    Removed(PathBuf),
}

/// Errors that can occur when setting up the watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to initialize the file system watcher.
    #[error("failed to create watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    /// The document does not exist or is not a regular file.
    #[error("document does not exist: {0}")]
    DocumentNotFound(PathBuf),
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Watches one document and emits its content after every settled change.
#[derive(Debug)]
pub struct DocumentWatcher {
    /// Kept alive to maintain the watch subscription.
    #[allow(dead_code)]
    watcher: RecommendedWatcher,

    /// Kept alive so the debounce task keeps running.
    #[allow(dead_code)]
    debouncer: ChangeDebouncer,

    path: PathBuf,
}

impl DocumentWatcher {
    /// Starts watching `path`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not exist or the file system
    /// watcher cannot be initialized.
    pub fn new(
        path: PathBuf,
        debounce: Duration,
        event_sender: mpsc::Sender<DocumentEvent>,
    ) -> Result<Self> {
        if !path.is_file() {
            return Err(WatcherError::DocumentNotFound(path));
        }

        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| WatcherError::DocumentNotFound(path.clone()))?;

        let watch_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tick_tx, tick_rx) = mpsc::channel(8);
        let debouncer = ChangeDebouncer::new(debounce, tick_tx);

        let path_for_task = path.clone();
        tokio::spawn(async move {
            process_ticks(path_for_task, tick_rx, event_sender).await;
        });

        let watcher = create_watcher(debouncer.sender(), &watch_dir, file_name)?;

        info!(
            path = %path.display(),
            debounce_ms = debounce.as_millis(),
            "Initialized document watcher"
        );

        Ok(Self {
            watcher,
            debouncer,
            path,
        })
    }

    /// Returns the watched document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Creates the underlying notify watcher with a lightweight callback.
fn create_watcher(
    signal_tx: mpsc::Sender<()>,
    watch_dir: &Path,
    file_name: OsString,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| match res {
            Ok(event) => {
                if is_relevant(&event, &file_name) {
                    trace!(kind = ?event.kind, "Document event");
                    // A full channel already holds a pending signal.
                    let _ = signal_tx.try_send(());
                }
            }
            Err(e) => error!(error = %e, "File watcher error"),
        },
        Config::default(),
    )?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    debug!(watch_dir = %watch_dir.display(), "Started directory watch");

    Ok(watcher)
}

/// Returns true if `event` may have changed the content of `file_name`.
fn is_relevant(event: &Event, file_name: &OsStr) -> bool {
    let content_kind = match event.kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any => true,
        EventKind::Access(_) | EventKind::Other => false,
    };

    content_kind
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

/// Reads the document after every debounced tick and forwards its content.
async fn process_ticks(
    path: PathBuf,
    mut ticks: mpsc::Receiver<()>,
    sender: mpsc::Sender<DocumentEvent>,
) {
    while ticks.recv().await.is_some() {
        let event = match tokio::fs::read_to_string(&path).await {
            Ok(content) => DocumentEvent::Changed(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Document removed");
                DocumentEvent::Removed(path.clone())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read document");
                continue;
            }
        };

        if sender.send(event).await.is_err() {
            debug!("Document event receiver dropped");
            break;
        }
    }

    debug!("Document reader shutting down");
}
