//! Error types for the checksync engine.

use thiserror::Error;

use crate::classify::ClassifyError;
use crate::reconcile::ReconcileError;

/// Errors that can occur while the engine processes a document.
///
/// None of these are fatal after construction: the engine logs them, passes
/// them to the notifier and keeps processing later changes.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The configured link scheme could not be turned into a grammar.
    #[error("invalid configuration: {0}")]
    Classify(#[from] ClassifyError),

    /// The document structure did not allow the rewrite.
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Reading or writing the document failed.
    #[error("document I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
