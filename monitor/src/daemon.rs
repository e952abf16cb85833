//! Wiring between configuration, the file system and the engine.

use std::path::Path;
use std::sync::Arc;

use checksync_engine::{ChangeReport, Engine, Notifier, SyncAdapter};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::backend::HttpTaskBackend;
use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::store::FileDocument;
use crate::watcher::DocumentEvent;

/// Initializes the tracing subscriber for logging.
///
/// Every command that drives the engine calls this so notifications reach
/// the log. Returns false if a subscriber was already installed.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .try_init()
        .is_ok()
}

/// Builds an engine for `document`.
///
/// Remote sync is enabled when the configuration names a task manager URL.
///
/// # Errors
///
/// Returns an error if the link scheme is invalid or the HTTP client cannot
/// be built.
pub fn build_engine(
    config: &Config,
    document: &Path,
    notifier: Arc<dyn Notifier>,
) -> Result<Engine> {
    let store = Arc::new(FileDocument::new(document));
    let engine = Engine::new(config.engine.clone(), store, notifier)?;

    let Some(url) = &config.tasks_url else {
        info!("No task manager configured, remote sync disabled");
        return Ok(engine);
    };

    let backend = HttpTaskBackend::new(url.clone()).map_err(|e| MonitorError::Http(e.to_string()))?;
    let adapter = SyncAdapter::new(Arc::new(backend)).with_grace(config.due_grace);

    info!(
        tasks_url = %url,
        grace_hours = config.due_grace.num_hours(),
        "Remote sync enabled"
    );

    Ok(engine.with_sync(adapter))
}

/// Feeds one watcher event to the engine.
///
/// Returns the change report for content changes. Spawned sync calls keep
/// running if the report is dropped.
pub fn handle_document_event(engine: &mut Engine, event: DocumentEvent) -> Option<ChangeReport> {
    match event {
        DocumentEvent::Changed(content) => {
            let report = engine.document_changed(&content);
            if report.is_empty() && report.rewrites == 0 {
                debug!("No completion changes");
            } else {
                info!(
                    events = report.events.len(),
                    rewrites = report.rewrites,
                    failures = report.failures.len(),
                    syncs = report.syncs.len(),
                    "Processed document change"
                );
            }
            Some(report)
        }
        DocumentEvent::Removed(path) => {
            warn!(path = %path.display(), "Document removed, waiting for it to reappear");
            engine.document_closed();
            None
        }
    }
}
