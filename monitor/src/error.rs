//! Error types for the checksync monitor.
//!
//! This module defines the error types used throughout the monitor crate,
//! providing structured error handling with clear, human-readable messages.

use checksync_engine::EngineError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::watcher::WatcherError;

/// Errors that can occur during monitor operations.
///
/// This is the primary error type for the monitor crate, encompassing all
/// possible failure modes.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine could not be built or failed to process the document.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// HTTP client error.
    ///
    /// This variant wraps failures to set up communication with the task
    /// manager.
    #[error("HTTP error: {0}")]
    Http(String),

    /// File watching error.
    #[error("file watch error: {0}")]
    Watch(#[from] WatcherError),
}

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
