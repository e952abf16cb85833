//! Line classifier for checkbox task lines.
//!
//! This module recognizes markdown checkbox lines and extracts the two pieces
//! of information the rest of the engine needs from them: the completion flag
//! and the embedded reference to a task in the external task manager.
//!
//! # Line Grammar
//!
//! | Element | Pattern |
//! |---------|---------|
//! | Checkbox line | `^\s*[-*]\s\[( \|x\|X)\]\s+.*$` |
//! | Completion stamp | ` ✅ YYYY-MM-DD` at end of line |
//! | Reference link | `<scheme>:///task/([\w-]+)(\.\d+)?` |
//!
//! # Example
//!
//! ```
//! use checksync_engine::classify::{LineClassifier, SuffixPolicy};
//!
//! let classifier = LineClassifier::new("omnifocus", SuffixPolicy::Strip).unwrap();
//! let line = classifier
//!     .classify("- [x] Buy milk [link](omnifocus:///task/AB12.7)")
//!     .unwrap();
//!
//! assert!(line.completed);
//! assert_eq!(line.reference.unwrap().as_str(), "AB12");
//! ```

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Emoji that introduces a completion stamp.
pub const COMPLETION_EMOJI: &str = "✅";

const CHECKBOX_PATTERN: &str = r"^\s*[-*]\s\[( |x|X)\]\s+.*$";

const COMPLETION_STAMP_PATTERN: &str = r" ✅ (\d{4}-\d{2}-\d{2})$";

/// Errors that can occur when building a [`LineClassifier`].
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The link scheme is empty or not a valid URI scheme.
    #[error("invalid link scheme: '{0}'")]
    InvalidScheme(String),

    /// The reference pattern failed to compile.
    #[error("invalid reference pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// How the dotted numeric suffix of a task identifier is handled.
///
/// A reference such as `omnifocus:///task/AB12.7` carries the identifier
/// `AB12` followed by the suffix `.7`. One policy applies to a whole
/// classifier so identifiers are extracted consistently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixPolicy {
    /// Drop the dotted suffix (`AB12.7` → `AB12`).
    #[default]
    Strip,
    /// Keep the dotted suffix (`AB12.7` → `AB12.7`).
    Preserve,
}

/// Opaque identifier of a task in the external task manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRef(String);

impl TaskRef {
    /// Creates a reference from a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A line recognized as a checkbox item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxLine {
    /// The raw line text.
    pub text: String,

    /// Whether the checkbox is ticked (`x` or `X`).
    pub completed: bool,

    /// Reference to the external task, if the line embeds one.
    pub reference: Option<TaskRef>,

    /// Date of a trailing completion stamp, if present.
    pub completion_date: Option<NaiveDate>,
}

impl CheckboxLine {
    /// Returns true if the line has no leading indentation.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        !self.text.starts_with(char::is_whitespace)
    }
}

fn checkbox_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CHECKBOX_PATTERN).expect("checkbox pattern is valid"))
}

pub(crate) fn completion_stamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(COMPLETION_STAMP_PATTERN).expect("completion stamp pattern is valid")
    })
}

/// Returns the completion flag of a checkbox line, or `None` if the line is
/// not a checkbox line.
///
/// # Example
///
/// ```
/// use checksync_engine::classify::checkbox_state;
///
/// assert_eq!(checkbox_state("- [x] done"), Some(true));
/// assert_eq!(checkbox_state("  * [ ] todo"), Some(false));
/// assert_eq!(checkbox_state("plain text"), None);
/// ```
#[must_use]
pub fn checkbox_state(line: &str) -> Option<bool> {
    let caps = checkbox_re().captures(line)?;
    Some(&caps[1] != " ")
}

/// Returns true if the line matches the checkbox grammar.
#[must_use]
pub fn is_checkbox_line(line: &str) -> bool {
    checkbox_re().is_match(line)
}

/// Returns the date of a trailing completion stamp, if any.
#[must_use]
pub fn completion_date(line: &str) -> Option<NaiveDate> {
    let caps = completion_stamp_re().captures(line)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

/// Classifies lines and extracts external task references.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    scheme: String,
    policy: SuffixPolicy,
    reference_re: Regex,
}

impl LineClassifier {
    /// Creates a classifier for links using the given URI scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidScheme`] if `scheme` is not a valid
    /// URI scheme (a letter followed by letters, digits, `+`, `-` or `.`).
    pub fn new(scheme: &str, policy: SuffixPolicy) -> Result<Self, ClassifyError> {
        if !is_valid_scheme(scheme) {
            return Err(ClassifyError::InvalidScheme(scheme.to_string()));
        }

        let pattern = format!(r"{}:///task/([\w-]+)(\.\d+)?", regex::escape(scheme));
        let reference_re = Regex::new(&pattern)?;

        Ok(Self {
            scheme: scheme.to_string(),
            policy,
            reference_re,
        })
    }

    /// Returns the link scheme this classifier recognizes.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the dotted-suffix policy.
    #[must_use]
    pub fn policy(&self) -> SuffixPolicy {
        self.policy
    }

    /// Classifies a single line.
    ///
    /// Returns `None` if the line is not a checkbox line. A checkbox line
    /// without a recognizable reference is still returned, with
    /// `reference: None`.
    #[must_use]
    pub fn classify(&self, line: &str) -> Option<CheckboxLine> {
        let completed = checkbox_state(line)?;

        Some(CheckboxLine {
            text: line.to_string(),
            completed,
            reference: self.extract_reference(line),
            completion_date: completion_date(line),
        })
    }

    /// Extracts the task reference from the first matching link in `line`.
    #[must_use]
    pub fn extract_reference(&self, line: &str) -> Option<TaskRef> {
        let caps = self.reference_re.captures(line)?;
        let id = match (self.policy, caps.get(2)) {
            (SuffixPolicy::Preserve, Some(suffix)) => format!("{}{}", &caps[1], suffix.as_str()),
            _ => caps[1].to_string(),
        };
        Some(TaskRef(id))
    }

    /// Classifies every line of `content`, keeping only checkbox lines in
    /// document order.
    #[must_use]
    pub fn checkbox_lines(&self, content: &str) -> Vec<CheckboxLine> {
        content.lines().filter_map(|line| self.classify(line)).collect()
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
