//! Diff normalizer for checkbox lines.
//!
//! Computes an [`IdentityKey`] per line: the body text with the checkbox
//! marker, the trailing completion stamp, surrounding whitespace and any
//! line-break characters removed. Two lines with the same key are the same
//! logical task, whatever their completion state.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::classify::{checkbox_state, completion_stamp_re};

const MARKER_PATTERN: &str = r"^\s*[-*]\s\[[ xX]\]";

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MARKER_PATTERN).expect("marker pattern is valid"))
}

/// Normalized body of a checkbox line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Removes the checkbox marker (and its indentation) from the start of a line.
#[must_use]
pub fn strip_marker(line: &str) -> String {
    marker_re().replace(line, "").into_owned()
}

/// Removes a trailing ` ✅ YYYY-MM-DD` completion stamp.
#[must_use]
pub fn strip_completion_stamp(line: &str) -> String {
    completion_stamp_re().replace(line, "").into_owned()
}

/// Computes the identity key of a line.
///
/// # Example
///
/// ```
/// use checksync_engine::normalize::identity_key;
///
/// let a = identity_key("- [ ] Buy milk");
/// let b = identity_key("- [x] Buy milk ✅ 2024-05-01  ");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "Buy milk");
/// ```
#[must_use]
pub fn identity_key(line: &str) -> IdentityKey {
    let single_line: String = line.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    let body = strip_marker(&single_line);
    let body = strip_completion_stamp(body.trim_end());
    IdentityKey(body.trim().to_string())
}

/// Returns true if `old` and `new` differ only by their completion marker
/// (optionally alongside an added or removed completion stamp).
///
/// Unrelated edits to the body, whitespace-only edits and stamp-only edits
/// all return false.
#[must_use]
pub fn acceptably_different(old: &str, new: &str) -> bool {
    if old == new {
        return false;
    }

    let (Some(old_state), Some(new_state)) = (checkbox_state(old), checkbox_state(new)) else {
        return false;
    };

    old_state != new_state && identity_key(old) == identity_key(new)
}
