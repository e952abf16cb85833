//! Change detector for checkbox completion state.
//!
//! Compares the checkbox lines of two document snapshots and emits one
//! [`CompletionEvent`] per line whose completion marker genuinely flipped.
//!
//! # Correlation Modes
//!
//! - [`DetectionMode::Positional`]: the i-th checkbox line of the old snapshot
//!   is compared with the i-th checkbox line of the new snapshot.
//! - [`DetectionMode::KeyMapped`]: lines are correlated by [`IdentityKey`], so
//!   moving a line elsewhere in the document does not produce an event. A new
//!   line with no counterpart emits an event only if it is already checked.
//!
//! In both modes a pair of lines only produces an event when
//! [`acceptably_different`] holds for it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::classify::{LineClassifier, TaskRef};
use crate::normalize::{acceptably_different, identity_key, IdentityKey};

/// How old and new checkbox lines are correlated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Compare lines at the same checkbox index.
    Positional,
    /// Compare lines sharing the same identity key.
    #[default]
    KeyMapped,
}

impl DetectionMode {
    /// Parses a mode name (`positional` or `key-mapped`).
    ///
    /// # Example
    ///
    /// ```
    /// use checksync_engine::detect::DetectionMode;
    ///
    /// assert_eq!(DetectionMode::parse("positional"), Some(DetectionMode::Positional));
    /// assert_eq!(DetectionMode::parse("key-mapped"), Some(DetectionMode::KeyMapped));
    /// assert_eq!(DetectionMode::parse("fuzzy"), None);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positional" => Some(Self::Positional),
            "key-mapped" | "key_mapped" | "keymapped" => Some(Self::KeyMapped),
            _ => None,
        }
    }
}

/// A genuine completion state change of one checkbox line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// The line text as it appears in the new snapshot.
    pub line: String,

    /// The completion state the line now shows.
    pub completed: bool,

    /// The external task the line refers to, if any.
    pub reference: Option<TaskRef>,
}

/// Detects completion state changes between two snapshots.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    classifier: LineClassifier,
    mode: DetectionMode,
}

impl ChangeDetector {
    /// Creates a detector using the given classifier and correlation mode.
    #[must_use]
    pub fn new(classifier: LineClassifier, mode: DetectionMode) -> Self {
        Self { classifier, mode }
    }

    /// Returns the correlation mode.
    #[must_use]
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Returns the line classifier.
    #[must_use]
    pub fn classifier(&self) -> &LineClassifier {
        &self.classifier
    }

    /// Compares two snapshots and returns the completion events in the order
    /// the lines appear in `new`.
    #[must_use]
    pub fn detect(&self, old: &str, new: &str) -> Vec<CompletionEvent> {
        if old == new {
            trace!("Snapshots identical, nothing to detect");
            return Vec::new();
        }

        let events = match self.mode {
            DetectionMode::Positional => self.detect_positional(old, new),
            DetectionMode::KeyMapped => self.detect_key_mapped(old, new),
        };

        debug!(
            mode = ?self.mode,
            event_count = events.len(),
            "Detected completion changes"
        );

        events
    }

    fn detect_positional(&self, old: &str, new: &str) -> Vec<CompletionEvent> {
        let old_lines = self.classifier.checkbox_lines(old);
        let new_lines = self.classifier.checkbox_lines(new);

        old_lines
            .iter()
            .zip(new_lines)
            .filter(|(before, after)| acceptably_different(&before.text, &after.text))
            .map(|(_, after)| CompletionEvent {
                line: after.text,
                completed: after.completed,
                reference: after.reference,
            })
            .collect()
    }

    fn detect_key_mapped(&self, old: &str, new: &str) -> Vec<CompletionEvent> {
        let old_by_key: HashMap<IdentityKey, String> = self
            .classifier
            .checkbox_lines(old)
            .into_iter()
            .map(|line| (identity_key(&line.text), line.text))
            .collect();

        let mut events = Vec::new();

        for line in self.classifier.checkbox_lines(new) {
            let key = identity_key(&line.text);

            let emit = match old_by_key.get(&key) {
                None => {
                    trace!(key = %key, completed = line.completed, "New checkbox line");
                    line.completed
                }
                Some(before) => before != &line.text && acceptably_different(before, &line.text),
            };

            if emit {
                events.push(CompletionEvent {
                    line: line.text,
                    completed: line.completed,
                    reference: line.reference,
                });
            }
        }

        events
    }
}
