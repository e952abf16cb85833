//! Remote sync adapter boundary.
//!
//! The engine never talks to a task manager directly. It hands a
//! [`TaskRef`] and the desired completion state to a [`SyncAdapter`], which
//! wraps a pluggable [`TaskBackend`] and applies the rules every backend
//! shares:
//!
//! - **No-op detection**: if the task already has the requested state, no
//!   update is issued and an [`SyncStatus::Unchanged`] outcome is returned.
//! - **Due date guard**: the task is only mutated when its due date is absent
//!   or not later than `now + grace`.
//! - **Never raises**: every failure becomes a [`SyncStatus::Failed`] outcome
//!   carrying diagnostic text. Callers treat it as non-fatal.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classify::TaskRef;

/// Phrase included in the outcome message when the due date guard blocks an
/// update.
pub const DUE_DATE_GUARD_PHRASE: &str = "outside due date window";

/// Errors reported by a [`TaskBackend`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// The task manager could not be reached.
    #[error("task manager unreachable: {0}")]
    Unreachable(String),

    /// The task manager has no task with this reference.
    #[error("task not found: {0}")]
    NotFound(TaskRef),

    /// The task manager rejected the request.
    #[error("task manager error: {0}")]
    Backend(String),
}

/// State of a task as reported by the task manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    /// Identifier of the task.
    pub id: String,

    /// Whether the task is complete.
    pub completed: bool,

    /// Due date of the task, if it has one.
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
}

/// Transport to an external task manager.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Fetches the current state of a task.
    async fn fetch(&self, reference: &TaskRef) -> Result<RemoteTask, SyncError>;

    /// Marks a task complete or incomplete.
    async fn set_completed(&self, reference: &TaskRef, completed: bool) -> Result<(), SyncError>;
}

/// Source of the current time for the due date guard.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result category of a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The task state was changed.
    Updated,
    /// The task already had the requested state.
    Unchanged,
    /// The update was not applied.
    Failed,
}

/// Outcome of a sync attempt, suitable for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Result category.
    pub status: SyncStatus,

    /// Human-readable status text.
    pub message: String,
}

impl SyncOutcome {
    fn new(status: SyncStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Returns true unless the attempt failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status != SyncStatus::Failed
    }
}

/// Applies completion changes to an external task manager.
#[derive(Clone)]
pub struct SyncAdapter {
    backend: Arc<dyn TaskBackend>,
    clock: Arc<dyn Clock>,
    grace: Duration,
}

impl SyncAdapter {
    /// Creates an adapter with zero grace period and the system clock.
    #[must_use]
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            grace: Duration::zero(),
        }
    }

    /// Sets the grace period added to "now" by the due date guard.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Replaces the clock used by the due date guard.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the grace period.
    #[must_use]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Brings the external task to the requested completion state.
    ///
    /// Never fails: errors are reported through the returned outcome.
    pub async fn sync_state(&self, reference: &TaskRef, completed: bool) -> SyncOutcome {
        let state = if completed { "complete" } else { "incomplete" };

        let task = match self.backend.fetch(reference).await {
            Ok(task) => task,
            Err(e) => {
                warn!(reference = %reference, error = %e, "Failed to fetch task");
                return SyncOutcome::new(SyncStatus::Failed, format!("❌ {reference}: {e}"));
            }
        };

        if task.completed == completed {
            debug!(reference = %reference, state, "Task already in requested state");
            return SyncOutcome::new(
                SyncStatus::Unchanged,
                format!("✅ {reference} already {state}"),
            );
        }

        if let Some(due) = task.due {
            let limit = self.clock.now() + self.grace;
            if due > limit {
                info!(
                    reference = %reference,
                    due = %due,
                    limit = %limit,
                    "Due date guard blocked update"
                );
                return SyncOutcome::new(
                    SyncStatus::Failed,
                    format!(
                        "❌ {reference}: {DUE_DATE_GUARD_PHRASE} (due {})",
                        due.format("%Y-%m-%d %H:%M")
                    ),
                );
            }
        }

        match self.backend.set_completed(reference, completed).await {
            Ok(()) => {
                info!(reference = %reference, state, "Task updated");
                SyncOutcome::new(SyncStatus::Updated, format!("✅ {reference} marked {state}"))
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, "Failed to update task");
                SyncOutcome::new(SyncStatus::Failed, format!("❌ {reference}: {e}"))
            }
        }
    }
}
