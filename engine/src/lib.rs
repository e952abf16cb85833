//! checksync engine - checkbox change detection and document reconciliation.
//!
//! This crate keeps the checkbox tasks of a markdown document in step with
//! an external task manager. It compares successive snapshots of the
//! document, works out which checkbox lines genuinely changed completion
//! state, pushes those changes to the task manager and moves completed lines
//! into a "Completed" section whose header count it keeps accurate.
//!
//! # Overview
//!
//! ```text
//! snapshot ──► classify / normalize ──► detect ──┬──► sync (spawned)
//!                                                 └──► reconcile ──► write ──► snapshot
//! ```
//!
//! Incidental edits such as trailing whitespace or an appended completion
//! stamp are not treated as changes. The engine caches everything it writes,
//! so its own writes are never read back as user edits.
//!
//! # Modules
//!
//! - [`classify`]: Checkbox line grammar and task reference extraction
//! - [`normalize`]: Identity keys and the "acceptably different" predicate
//! - [`detect`]: Positional and key-mapped change detection
//! - [`snapshot`]: Single-slot cache of the previous document content
//! - [`sync`]: Remote task manager boundary with the due date guard
//! - [`reconcile`]: Completed-section maintenance and header counts
//! - [`engine`]: Event-driven engine tying the above together
//! - [`error`]: Error types for engine operations

pub mod classify;
pub mod detect;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod reconcile;
pub mod snapshot;
pub mod sync;

pub use classify::{CheckboxLine, ClassifyError, LineClassifier, SuffixPolicy, TaskRef};
pub use detect::{ChangeDetector, CompletionEvent, DetectionMode};
pub use engine::{ChangeReport, DocumentStore, Engine, EngineConfig, Notifier};
pub use error::{EngineError, Result};
pub use normalize::{acceptably_different, identity_key, IdentityKey};
pub use reconcile::{
    ReconcileError, ReconcileMode, Reconciler, SectionConfig, SectionCounts,
};
pub use snapshot::SnapshotCache;
pub use sync::{
    Clock, RemoteTask, SyncAdapter, SyncError, SyncOutcome, SyncStatus, SystemClock, TaskBackend,
};
