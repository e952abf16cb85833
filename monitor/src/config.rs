//! Configuration module for the checksync monitor.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `CHECKSYNC_DOCUMENT` | For `run`/`tidy` | - | Markdown document to keep in sync |
//! | `CHECKSYNC_DETECTION` | No | `key-mapped` | Change detection mode (`key-mapped` or `positional`) |
//! | `CHECKSYNC_RECONCILE` | No | `per-event` | Reconciliation strategy (`per-event` or `batch`) |
//! | `CHECKSYNC_MOVE_COMPLETED` | No | `true` | Move completed tasks into the completed section |
//! | `CHECKSYNC_COMPLETED_HEADER` | No | `Completed` | Name of the completed section |
//! | `CHECKSYNC_PENDING_HEADER` | No | `Pending` | Name of the pending section |
//! | `CHECKSYNC_COUNT_SUFFIX` | No | `个` | Text appended to header counts |
//! | `CHECKSYNC_LINK_SCHEME` | No | `omnifocus` | URI scheme of task links |
//! | `CHECKSYNC_KEEP_DOTTED_SUFFIX` | No | `false` | Keep `.N` suffixes in task identifiers |
//! | `CHECKSYNC_TASKS_URL` | No | - | Task manager base URL (enables remote sync) |
//! | `CHECKSYNC_DUE_GRACE_DAYS` | No | 0 | Days added to "now" by the due date guard (0-1) |
//! | `CHECKSYNC_DEBOUNCE_MS` | No | 100 | Quiet period before a file change is processed |
//!
//! # Example
//!
//! ```no_run
//! use checksync_monitor::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Document: {:?}", config.document);
//! ```

use std::env;
use std::path::{Path, PathBuf};

use checksync_engine::{DetectionMode, EngineConfig, ReconcileMode, SuffixPolicy};
use thiserror::Error;

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Maximum allowed due date grace period in days.
const MAX_DUE_GRACE_DAYS: i64 = 1;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Configuration for the checksync monitor.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the watched document. Only `run` and `tidy` need it.
    pub document: Option<PathBuf>,

    /// Detection, reconciliation and grammar settings for the engine.
    pub engine: EngineConfig,

    /// Base URL of the task manager. Remote sync is disabled when `None`.
    pub tasks_url: Option<String>,

    /// Grace period added to "now" by the due date guard.
    pub due_grace: chrono::Duration,

    /// Quiet period in milliseconds before a burst of file events is
    /// processed.
    pub debounce_ms: u64,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any variable is set to a value that cannot
    /// be parsed, such as an unknown detection mode, a non-boolean flag or a
    /// grace period outside 0-1 days.
    pub fn from_env() -> Result<Self, ConfigError> {
        let document = env::var("CHECKSYNC_DOCUMENT").ok().map(PathBuf::from);

        let detection = match env::var("CHECKSYNC_DETECTION") {
            Ok(val) => DetectionMode::parse(val.trim()).ok_or_else(|| ConfigError::InvalidValue {
                key: "CHECKSYNC_DETECTION".to_string(),
                message: format!("expected 'key-mapped' or 'positional', got '{val}'"),
            })?,
            Err(_) => DetectionMode::default(),
        };

        let reconcile = match env::var("CHECKSYNC_RECONCILE") {
            Ok(val) => ReconcileMode::parse(val.trim()).ok_or_else(|| ConfigError::InvalidValue {
                key: "CHECKSYNC_RECONCILE".to_string(),
                message: format!("expected 'per-event' or 'batch', got '{val}'"),
            })?,
            Err(_) => ReconcileMode::default(),
        };

        let move_completed = bool_var("CHECKSYNC_MOVE_COMPLETED", true)?;
        let keep_dotted_suffix = bool_var("CHECKSYNC_KEEP_DOTTED_SUFFIX", false)?;

        let defaults = EngineConfig::default();
        let mut sections = defaults.sections;
        if let Some(name) = non_empty_var("CHECKSYNC_COMPLETED_HEADER") {
            sections.completed = name;
        }
        if let Some(name) = non_empty_var("CHECKSYNC_PENDING_HEADER") {
            sections.pending = name;
        }
        if let Ok(suffix) = env::var("CHECKSYNC_COUNT_SUFFIX") {
            sections.count_suffix = suffix;
        }

        let link_scheme = non_empty_var("CHECKSYNC_LINK_SCHEME").unwrap_or(defaults.link_scheme);

        let tasks_url = non_empty_var("CHECKSYNC_TASKS_URL")
            .map(|url| url.trim_end_matches('/').to_string());

        // Optional: CHECKSYNC_DUE_GRACE_DAYS (default: 0, must be 0-1)
        let due_grace_days = match env::var("CHECKSYNC_DUE_GRACE_DAYS") {
            Ok(val) => {
                let days = val.trim().parse::<i64>().map_err(|_| ConfigError::InvalidValue {
                    key: "CHECKSYNC_DUE_GRACE_DAYS".to_string(),
                    message: format!("expected integer 0-{MAX_DUE_GRACE_DAYS}, got '{val}'"),
                })?;
                if !(0..=MAX_DUE_GRACE_DAYS).contains(&days) {
                    return Err(ConfigError::InvalidValue {
                        key: "CHECKSYNC_DUE_GRACE_DAYS".to_string(),
                        message: format!(
                            "grace period must be between 0 and {MAX_DUE_GRACE_DAYS} days, got {days}"
                        ),
                    });
                }
                days
            }
            Err(_) => 0,
        };

        // Optional: CHECKSYNC_DEBOUNCE_MS (default: 100)
        let debounce_ms = match env::var("CHECKSYNC_DEBOUNCE_MS") {
            Ok(val) => val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "CHECKSYNC_DEBOUNCE_MS".to_string(),
                message: format!("expected non-negative integer, got '{val}'"),
            })?,
            Err(_) => DEFAULT_DEBOUNCE_MS,
        };

        Ok(Self {
            document,
            engine: EngineConfig {
                detection,
                reconcile,
                move_completed,
                sections,
                link_scheme,
                suffix_policy: if keep_dotted_suffix {
                    SuffixPolicy::Preserve
                } else {
                    SuffixPolicy::Strip
                },
            },
            tasks_url,
            due_grace: chrono::Duration::days(due_grace_days),
            debounce_ms,
        })
    }

    /// Returns the document path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `CHECKSYNC_DOCUMENT` is not
    /// set.
    pub fn require_document(&self) -> Result<&Path, ConfigError> {
        self.document
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("CHECKSYNC_DOCUMENT".to_string()))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn bool_var(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Ok(val) = env::var(key) else {
        return Ok(default);
    };

    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean, got '{val}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to run tests with isolated environment variables.
    /// Clears all CHECKSYNC_* vars before the test and restores them after.
    fn with_clean_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let saved_vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with("CHECKSYNC_"))
            .collect();

        for (key, _) in &saved_vars {
            env::remove_var(key);
        }

        let result = f();

        for (key, _) in env::vars().filter(|(k, _)| k.starts_with("CHECKSYNC_")) {
            env::remove_var(key);
        }
        for (key, value) in saved_vars {
            env::set_var(key, value);
        }

        result
    }

    #[test]
    #[serial]
    fn test_defaults() {
        with_clean_env(|| {
            let config = Config::from_env().expect("should parse empty config");

            assert!(config.document.is_none());
            assert!(config.tasks_url.is_none());
            assert_eq!(config.engine, EngineConfig::default());
            assert_eq!(config.due_grace, chrono::Duration::zero());
            assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
        });
    }

    #[test]
    #[serial]
    fn test_missing_document() {
        with_clean_env(|| {
            let config = Config::from_env().unwrap();
            let err = config.require_document().unwrap_err();
            assert!(matches!(err, ConfigError::MissingEnvVar(ref s) if s == "CHECKSYNC_DOCUMENT"));
        });
    }

    #[test]
    #[serial]
    fn test_full_config() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_DOCUMENT", "/notes/today.md");
            env::set_var("CHECKSYNC_DETECTION", "positional");
            env::set_var("CHECKSYNC_RECONCILE", "batch");
            env::set_var("CHECKSYNC_MOVE_COMPLETED", "no");
            env::set_var("CHECKSYNC_COMPLETED_HEADER", "Done");
            env::set_var("CHECKSYNC_PENDING_HEADER", "Todo");
            env::set_var("CHECKSYNC_COUNT_SUFFIX", " items");
            env::set_var("CHECKSYNC_LINK_SCHEME", "things");
            env::set_var("CHECKSYNC_KEEP_DOTTED_SUFFIX", "true");
            env::set_var("CHECKSYNC_TASKS_URL", "http://localhost:8080/api/");
            env::set_var("CHECKSYNC_DUE_GRACE_DAYS", "1");
            env::set_var("CHECKSYNC_DEBOUNCE_MS", "250");

            let config = Config::from_env().expect("should parse full config");

            assert_eq!(
                config.require_document().unwrap(),
                Path::new("/notes/today.md")
            );
            assert_eq!(config.engine.detection, DetectionMode::Positional);
            assert_eq!(config.engine.reconcile, ReconcileMode::Batch);
            assert!(!config.engine.move_completed);
            assert_eq!(config.engine.sections.completed, "Done");
            assert_eq!(config.engine.sections.pending, "Todo");
            assert_eq!(config.engine.sections.count_suffix, " items");
            assert_eq!(config.engine.link_scheme, "things");
            assert_eq!(config.engine.suffix_policy, SuffixPolicy::Preserve);
            assert_eq!(config.tasks_url.as_deref(), Some("http://localhost:8080/api"));
            assert_eq!(config.due_grace, chrono::Duration::days(1));
            assert_eq!(config.debounce_ms, 250);
        });
    }

    #[test]
    #[serial]
    fn test_invalid_detection_mode() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_DETECTION", "fuzzy");

            let err = Config::from_env().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, .. } if key == "CHECKSYNC_DETECTION"
            ));
        });
    }

    #[test]
    #[serial]
    fn test_invalid_reconcile_mode() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_RECONCILE", "sometimes");

            let err = Config::from_env().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, .. } if key == "CHECKSYNC_RECONCILE"
            ));
        });
    }

    #[test]
    #[serial]
    fn test_invalid_boolean() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_MOVE_COMPLETED", "maybe");

            let err = Config::from_env().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, ref message }
                    if key == "CHECKSYNC_MOVE_COMPLETED" && message.contains("boolean")
            ));
        });
    }

    #[test]
    #[serial]
    fn test_grace_period_out_of_range() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_DUE_GRACE_DAYS", "2");

            let err = Config::from_env().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, ref message }
                    if key == "CHECKSYNC_DUE_GRACE_DAYS" && message.contains("between 0 and 1")
            ));
        });
    }

    #[test]
    #[serial]
    fn test_invalid_grace_period() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_DUE_GRACE_DAYS", "one");

            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    #[serial]
    fn test_invalid_debounce() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_DEBOUNCE_MS", "-5");

            let err = Config::from_env().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, .. } if key == "CHECKSYNC_DEBOUNCE_MS"
            ));
        });
    }

    #[test]
    #[serial]
    fn test_blank_values_fall_back_to_defaults() {
        with_clean_env(|| {
            env::set_var("CHECKSYNC_COMPLETED_HEADER", "   ");
            env::set_var("CHECKSYNC_TASKS_URL", "");

            let config = Config::from_env().unwrap();
            assert_eq!(config.engine.sections.completed, "Completed");
            assert!(config.tasks_url.is_none());
        });
    }
}
