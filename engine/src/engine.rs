//! Event-driven engine tying detection, remote sync and reconciliation
//! together for one active document.
//!
//! The engine reacts to two inputs:
//!
//! - [`Engine::document_opened`]: the active document switched; the snapshot
//!   cache is reset to its content.
//! - [`Engine::document_changed`]: the document changed on disk or in the
//!   editor. The new content is diffed against the cached snapshot and every
//!   genuine completion change is synced and reconciled.
//!
//! Remote sync calls are spawned on the tokio runtime and never awaited by
//! the reconciliation path: a slow or failing task manager cannot hold up or
//! block the document rewrite. Every write the engine performs is cached as
//! the next snapshot, so the change notification caused by that write
//! produces no events.

use std::fmt;
use std::io;
use std::sync::Arc;

use chrono::{Local, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::classify::{LineClassifier, SuffixPolicy};
use crate::detect::{ChangeDetector, CompletionEvent, DetectionMode};
use crate::error::{EngineError, Result};
use crate::reconcile::{ReconcileMode, Reconciler, SectionConfig};
use crate::snapshot::SnapshotCache;
use crate::sync::{SyncAdapter, SyncOutcome};

/// Default URI scheme of task links.
pub const DEFAULT_LINK_SCHEME: &str = "omnifocus";

/// Access to the active document.
///
/// Writes replace the whole document at once.
pub trait DocumentStore: Send + Sync {
    /// Reads the current document content.
    fn read(&self) -> io::Result<String>;

    /// Replaces the document content.
    fn write(&self, content: &str) -> io::Result<()>;
}

/// Displays short messages to the user.
pub trait Notifier: Send + Sync {
    /// Shows `message`.
    fn notify(&self, message: &str);
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How changed lines are correlated across snapshots.
    pub detection: DetectionMode,

    /// Which reconciliation strategy runs after a change.
    pub reconcile: ReconcileMode,

    /// Whether completed lines are moved into the completed section.
    pub move_completed: bool,

    /// Managed section names and layout.
    pub sections: SectionConfig,

    /// URI scheme of task links, e.g. `omnifocus`.
    pub link_scheme: String,

    /// Handling of dotted suffixes in task identifiers.
    pub suffix_policy: SuffixPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionMode::default(),
            reconcile: ReconcileMode::default(),
            move_completed: true,
            sections: SectionConfig::default(),
            link_scheme: DEFAULT_LINK_SCHEME.to_string(),
            suffix_policy: SuffixPolicy::default(),
        }
    }
}

/// Result of processing one document change.
#[derive(Default)]
pub struct ChangeReport {
    /// Completion events detected, in document order.
    pub events: Vec<CompletionEvent>,

    /// Number of document writes performed.
    pub rewrites: usize,

    /// Errors that prevented a rewrite. Already logged and notified.
    pub failures: Vec<EngineError>,

    /// Spawned remote sync calls.
    pub syncs: Vec<JoinHandle<SyncOutcome>>,
}

impl ChangeReport {
    /// Returns true if nothing was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Waits for every spawned sync call and returns their outcomes.
    ///
    /// Calls that panicked or were cancelled are skipped.
    pub async fn join_syncs(&mut self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::with_capacity(self.syncs.len());
        for handle in self.syncs.drain(..) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "Sync task did not complete"),
            }
        }
        outcomes
    }
}

impl fmt::Debug for ChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeReport")
            .field("events", &self.events)
            .field("rewrites", &self.rewrites)
            .field("failures", &self.failures)
            .field("syncs", &self.syncs.len())
            .finish()
    }
}

fn local_time_of_day() -> NaiveTime {
    Local::now().time()
}

/// Change-detection and reconciliation engine for one active document.
pub struct Engine {
    detector: ChangeDetector,
    reconciler: Reconciler,
    mode: ReconcileMode,
    move_completed: bool,
    snapshot: SnapshotCache,
    sync: Option<SyncAdapter>,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    time_of_day: fn() -> NaiveTime,
}

impl Engine {
    /// Creates an engine without remote sync.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Classify`] if the link scheme is invalid.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let classifier = LineClassifier::new(&config.link_scheme, config.suffix_policy)?;

        Ok(Self {
            detector: ChangeDetector::new(classifier, config.detection),
            reconciler: Reconciler::new(config.sections),
            mode: config.reconcile,
            move_completed: config.move_completed,
            snapshot: SnapshotCache::new(),
            sync: None,
            store,
            notifier,
            time_of_day: local_time_of_day,
        })
    }

    /// Enables remote sync through `adapter`.
    #[must_use]
    pub fn with_sync(mut self, adapter: SyncAdapter) -> Self {
        self.sync = Some(adapter);
        self
    }

    /// Replaces the source of the ` HH:MM` stamp added to moved lines.
    #[must_use]
    pub fn with_time_of_day(mut self, time_of_day: fn() -> NaiveTime) -> Self {
        self.time_of_day = time_of_day;
        self
    }

    /// Returns the cached snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.current()
    }

    /// Returns the reconciler.
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Returns the change detector.
    #[must_use]
    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// Resets the snapshot to the content of a newly opened document.
    pub fn document_opened(&mut self, content: &str) {
        debug!(bytes = content.len(), "Document opened");
        self.snapshot.reset(content);
    }

    /// Drops the snapshot after the document disappeared.
    ///
    /// The next change only re-arms the cache.
    pub fn document_closed(&mut self) {
        debug!("Document closed");
        self.snapshot.clear();
    }

    /// Processes a change of the active document.
    ///
    /// Must be called from within a tokio runtime: remote sync calls are
    /// spawned and returned in the report without being awaited.
    pub fn document_changed(&mut self, content: &str) -> ChangeReport {
        let mut report = ChangeReport::default();

        let Some(previous) = self.snapshot.current().map(str::to_owned) else {
            debug!("No previous snapshot, caching content");
            self.snapshot.reset(content);
            return report;
        };

        if self.snapshot.matches(content) {
            return report;
        }

        let events = self.detector.detect(&previous, content);
        self.snapshot.reset(content);

        if events.is_empty() {
            debug!("Change contained no completion events");
        } else {
            info!(events = events.len(), "Detected completion changes");
        }

        for event in &events {
            if let Some(handle) = self.spawn_sync(event) {
                report.syncs.push(handle);
            }
        }

        if self.move_completed {
            match self.mode {
                ReconcileMode::PerEvent => {
                    for event in events.iter().filter(|e| e.completed) {
                        let result = self.reconcile_event(event);
                        self.record(result, &mut report);
                    }
                }
                // Batch rescans on every content change, events or not.
                ReconcileMode::Batch => {
                    let result = self.reconcile_batch();
                    self.record(result, &mut report);
                }
            }
        }

        report.events = events;
        report
    }

    /// Runs one batch reconciliation over the stored document.
    ///
    /// Returns true if the document was rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if reading or writing the document fails.
    pub fn tidy(&mut self) -> Result<bool> {
        self.reconcile_batch()
    }

    fn spawn_sync(&self, event: &CompletionEvent) -> Option<JoinHandle<SyncOutcome>> {
        let adapter = self.sync.clone()?;
        let Some(reference) = event.reference.clone() else {
            debug!(line = %event.line, "No task reference, skipping remote sync");
            return None;
        };

        let notifier = Arc::clone(&self.notifier);
        let completed = event.completed;

        Some(tokio::spawn(async move {
            let outcome = adapter.sync_state(&reference, completed).await;
            notifier.notify(&outcome.message);
            outcome
        }))
    }

    fn reconcile_event(&mut self, event: &CompletionEvent) -> Result<bool> {
        let content = self.store.read()?;
        let updated = self
            .reconciler
            .reconcile_event(&content, event, (self.time_of_day)())?;
        self.persist(updated)?;
        Ok(true)
    }

    fn reconcile_batch(&mut self) -> Result<bool> {
        let content = self.store.read()?;
        match self.reconciler.reconcile_batch(&content, (self.time_of_day)()) {
            Some(updated) => {
                self.persist(updated)?;
                Ok(true)
            }
            None => {
                debug!("Document already reconciled");
                Ok(false)
            }
        }
    }

    fn persist(&mut self, content: String) -> Result<()> {
        self.store.write(&content)?;
        debug!(bytes = content.len(), "Document rewritten");
        self.snapshot.reset(content);
        Ok(())
    }

    fn record(&self, result: Result<bool>, report: &mut ChangeReport) {
        match result {
            Ok(true) => report.rewrites += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Reconciliation failed");
                self.notifier.notify(&format!("❌ {e}"));
                report.failures.push(e);
            }
        }
    }
}
