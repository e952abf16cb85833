//! Document reconciler.
//!
//! Moves completed checkbox lines into the "completed" section of a document
//! and keeps the count annotations of the section headers accurate.
//!
//! # Section Headers
//!
//! A section starts at a line `## <name>`, optionally followed by a count
//! annotation the reconciler owns, and ends at the next heading or at the
//! end of the document:
//!
//! ```text
//! ## Pending - 2个
//! - [ ] Call mum
//! - [ ] Buy bread
//!
//! ## Completed - 1个
//! - [x] Buy milk 13:05
//! ```
//!
//! # Strategies
//!
//! - [`Reconciler::reconcile_event`] handles one completion event: the line
//!   is removed, time-stamped and inserted below the completed header. A
//!   missing header is an error; nothing is created.
//! - [`Reconciler::reconcile_batch`] rescans the whole document and moves
//!   every top-level completed line found above the completed header,
//!   creating the header when needed. Running it on its own output is a
//!   no-op.
//!
//! Both operate on text and return the full rewritten document; the caller
//! persists it in a single write.

use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::classify::checkbox_state;
use crate::detect::CompletionEvent;

/// Default name of the completed section.
pub const DEFAULT_COMPLETED_SECTION: &str = "Completed";

/// Default name of the pending section.
pub const DEFAULT_PENDING_SECTION: &str = "Pending";

/// Default suffix appended to header counts.
pub const DEFAULT_COUNT_SUFFIX: &str = "个";

/// Default distance between the completed header and the insertion point.
pub const DEFAULT_INSERT_OFFSET: usize = 2;

const TIME_STAMP_PATTERN: &str = r" [0-2]\d:[0-5]\d$";

fn time_stamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIME_STAMP_PATTERN).expect("time stamp pattern is valid"))
}

/// Errors that abort a per-event reconciliation.
///
/// The document is left untouched when either occurs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The event's line is no longer present in the document.
    #[error("line not found in document: {0}")]
    LineNotFound(String),

    /// The completed section header is missing.
    #[error("section header not found: ## {0}")]
    MissingSection(String),
}

/// Which reconciliation strategy runs after a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileMode {
    /// Reconcile once per completion event.
    #[default]
    PerEvent,
    /// Rescan the whole document after every change.
    Batch,
}

impl ReconcileMode {
    /// Parses a mode name (`per-event` or `batch`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "per-event" | "per_event" | "event" => Some(Self::PerEvent),
            "batch" => Some(Self::Batch),
            _ => None,
        }
    }
}

/// Names and layout of the managed sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Name of the completed section (`## <completed>`).
    pub completed: String,

    /// Name of the pending section (`## <pending>`).
    pub pending: String,

    /// Text appended after the count, e.g. `个` in `## Completed - 3个`.
    pub count_suffix: String,

    /// Lines below the completed header where moved tasks are inserted.
    pub insert_offset: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            completed: DEFAULT_COMPLETED_SECTION.to_string(),
            pending: DEFAULT_PENDING_SECTION.to_string(),
            count_suffix: DEFAULT_COUNT_SUFFIX.to_string(),
            insert_offset: DEFAULT_INSERT_OFFSET,
        }
    }
}

/// Stated and actual count of one section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderCount {
    /// Zero-based line index of the header.
    pub line: usize,

    /// Count written in the header, if it has one.
    pub stated: Option<usize>,

    /// Number of matching checkbox lines in the section.
    pub actual: usize,
}

impl HeaderCount {
    /// Returns true if the stated count equals the actual count.
    #[must_use]
    pub fn is_accurate(&self) -> bool {
        self.stated == Some(self.actual)
    }
}

/// Header counts of both managed sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounts {
    /// The completed section (counts checked lines).
    pub completed: Option<HeaderCount>,

    /// The pending section (counts unchecked lines).
    pub pending: Option<HeaderCount>,
}

/// Document lines plus the line-ending details needed to render them back.
#[derive(Debug)]
struct LineBuffer {
    lines: Vec<String>,
    newline: &'static str,
    trailing_newline: bool,
}

impl LineBuffer {
    fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
            newline: if content.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: content.ends_with('\n'),
        }
    }

    fn render(&self) -> String {
        let mut out = self.lines.join(self.newline);
        if self.trailing_newline {
            out.push_str(self.newline);
        }
        out
    }
}

/// Rewrites documents to move completed tasks and maintain header counts.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    sections: SectionConfig,
}

impl Reconciler {
    /// Creates a reconciler for the given sections.
    #[must_use]
    pub fn new(sections: SectionConfig) -> Self {
        Self { sections }
    }

    /// Returns the section configuration.
    #[must_use]
    pub fn sections(&self) -> &SectionConfig {
        &self.sections
    }

    /// Moves the line of a completion event into the completed section.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::LineNotFound`] if no line of `content` matches the
    ///   event's line after trimming.
    /// - [`ReconcileError::MissingSection`] if the completed header is absent.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveTime;
    /// use checksync_engine::detect::CompletionEvent;
    /// use checksync_engine::reconcile::Reconciler;
    ///
    /// let event = CompletionEvent {
    ///     line: "- [x] Buy milk".to_string(),
    ///     completed: true,
    ///     reference: None,
    /// };
    /// let now = NaiveTime::from_hms_opt(13, 5, 0).unwrap();
    ///
    /// let out = Reconciler::default()
    ///     .reconcile_event("- [x] Buy milk\n## Completed - 0个", &event, now)
    ///     .unwrap();
    /// assert_eq!(out, "## Completed - 1个\n- [x] Buy milk 13:05");
    /// ```
    pub fn reconcile_event(
        &self,
        content: &str,
        event: &CompletionEvent,
        now: NaiveTime,
    ) -> Result<String, ReconcileError> {
        let mut doc = LineBuffer::parse(content);
        let target = event.line.trim();

        let index = doc
            .lines
            .iter()
            .position(|line| line.trim() == target)
            .ok_or_else(|| ReconcileError::LineNotFound(target.to_string()))?;

        let removed = doc.lines.remove(index);
        let task = stamp_exact(removed.trim(), now);

        let header = self
            .find_header(&doc.lines, &self.sections.completed)
            .ok_or_else(|| ReconcileError::MissingSection(self.sections.completed.clone()))?;

        let at = self.insertion_point(&doc.lines, header);
        trace!(from = index, to = at, "Moving completed line");
        doc.lines.insert(at, task);

        self.rewrite_counts(&mut doc.lines);

        Ok(doc.render())
    }

    /// Moves every top-level completed line found above the completed header
    /// (or anywhere, if the header is missing) into the completed section.
    ///
    /// Returns `None` when the document is already reconciled.
    #[must_use]
    pub fn reconcile_batch(&self, content: &str, now: NaiveTime) -> Option<String> {
        let mut doc = LineBuffer::parse(content);
        let header = self.find_header(&doc.lines, &self.sections.completed);
        let limit = header.unwrap_or(doc.lines.len());

        let indices: Vec<usize> = (0..limit)
            .filter(|&i| is_top_level_completed(&doc.lines[i]))
            .collect();

        let mut moved: Vec<String> = indices
            .iter()
            .rev()
            .map(|&i| doc.lines.remove(i))
            .collect();
        moved.reverse();

        if !moved.is_empty() {
            let header = match self.find_header(&doc.lines, &self.sections.completed) {
                Some(header) => header,
                None => self.append_completed_header(&mut doc.lines),
            };

            let at = self.insertion_point(&doc.lines, header);
            let stamped = moved.iter().map(|line| stamp_any(line.trim_end(), now));
            doc.lines.splice(at..at, stamped);

            debug!(moved = moved.len(), "Moved completed lines into section");
        }

        self.rewrite_counts(&mut doc.lines);

        let rendered = doc.render();
        (rendered != content).then_some(rendered)
    }

    /// Reports stated and actual counts of both managed headers.
    #[must_use]
    pub fn section_counts(&self, content: &str) -> SectionCounts {
        let lines: Vec<&str> = content.lines().collect();

        let count = |name: &str, checked: bool| {
            self.find_header(&lines, name).map(|line| HeaderCount {
                line,
                stated: stated_count(lines[line], name),
                actual: count_in_section(&lines, line, checked),
            })
        };

        SectionCounts {
            completed: count(&self.sections.completed, true),
            pending: count(&self.sections.pending, false),
        }
    }

    /// Renders a header line with the given count.
    #[must_use]
    pub fn render_header(&self, name: &str, count: usize) -> String {
        format!("## {name} - {count}{}", self.sections.count_suffix)
    }

    fn find_header<S: AsRef<str>>(&self, lines: &[S], name: &str) -> Option<usize> {
        let suffix = &self.sections.count_suffix;
        lines
            .iter()
            .position(|line| is_section_header(line.as_ref(), name, suffix))
    }

    fn insertion_point(&self, lines: &[String], header: usize) -> usize {
        let mut at = (header + self.sections.insert_offset.max(1)).min(lines.len());
        while at > header + 1 && lines[at - 1].trim().is_empty() {
            at -= 1;
        }
        at
    }

    fn append_completed_header(&self, lines: &mut Vec<String>) -> usize {
        if lines.last().is_some_and(|line| !line.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push(self.render_header(&self.sections.completed, 0));
        debug!(section = %self.sections.completed, "Created completed section header");
        lines.len() - 1
    }

    fn rewrite_counts(&self, lines: &mut [String]) {
        for (name, checked) in [
            (self.sections.completed.as_str(), true),
            (self.sections.pending.as_str(), false),
        ] {
            if let Some(header) = self.find_header(lines, name) {
                let count = count_in_section(lines, header, checked);
                lines[header] = self.render_header(name, count);
            }
        }
    }
}

/// Matches `## <name>` followed by nothing or by the owned count annotation
/// (`- <digits><suffix>`). Any other text makes it a user heading.
fn is_section_header(line: &str, name: &str, suffix: &str) -> bool {
    let Some(rest) = line.strip_prefix("## ").and_then(|rest| rest.strip_prefix(name)) else {
        return false;
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return true;
    }

    let Some(annotation) = rest.strip_prefix('-') else {
        return false;
    };
    let tail = annotation
        .trim_start()
        .trim_start_matches(|c: char| c.is_ascii_digit());
    tail.is_empty() || (!suffix.is_empty() && tail == suffix)
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(char::is_whitespace)
}

fn is_top_level_completed(line: &str) -> bool {
    !line.starts_with(char::is_whitespace) && checkbox_state(line) == Some(true)
}

fn count_in_section<S: AsRef<str>>(lines: &[S], header: usize, checked: bool) -> usize {
    lines[header + 1..]
        .iter()
        .map(AsRef::as_ref)
        .take_while(|line| !is_heading(line))
        .filter(|line| checkbox_state(line) == Some(checked))
        .count()
}

fn stated_count(line: &str, name: &str) -> Option<usize> {
    let annotation = line.strip_prefix("## ")?.strip_prefix(name)?.trim_start();
    let digits: String = annotation
        .strip_prefix('-')?
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Appends ` HH:MM` unless the line already ends with exactly that stamp.
fn stamp_exact(line: &str, now: NaiveTime) -> String {
    let stamp = format!(" {}", now.format("%H:%M"));
    if line.ends_with(&stamp) {
        line.to_string()
    } else {
        format!("{line}{stamp}")
    }
}

/// Appends ` HH:MM` unless the line already ends with a stamp in that form.
fn stamp_any(line: &str, now: NaiveTime) -> String {
    if time_stamp_re().is_match(line) {
        line.to_string()
    } else {
        format!("{line} {}", now.format("%H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn completed(line: &str) -> CompletionEvent {
        CompletionEvent {
            line: line.to_string(),
            completed: true,
            reference: None,
        }
    }

    // =========================================================================
    // Header helpers
    // =========================================================================

    #[test]
    fn section_header_matching() {
        assert!(is_section_header("## Completed", "Completed", "个"));
        assert!(is_section_header("## Completed  ", "Completed", "个"));
        assert!(is_section_header("## Completed - 4个", "Completed", "个"));
        assert!(is_section_header("## Completed -4", "Completed", "个"));
        assert!(is_section_header("## Completed - 4", "Completed", ""));
        assert!(!is_section_header("## CompletedX", "Completed", "个"));
        assert!(!is_section_header("### Completed", "Completed", "个"));
        assert!(!is_section_header(" ## Completed", "Completed", "个"));
    }

    #[test]
    fn user_headings_sharing_a_prefix_are_not_sections() {
        assert!(!is_section_header("## Completed projects", "Completed", "个"));
        assert!(!is_section_header("## Pending review notes", "Pending", "个"));
        assert!(!is_section_header("## Completed - 4 items", "Completed", "个"));
        assert!(!is_section_header("## Completed - 4个 old", "Completed", "个"));
        assert!(!is_section_header("## Completed - many", "Completed", "个"));
    }

    #[test]
    fn batch_leaves_user_completed_heading_alone() {
        let r = Reconciler::default();
        let doc = "## Completed projects\n- [x] shipped v1\n\n## Completed - 0个\n";

        let out = r.reconcile_batch(doc, at(9, 0)).unwrap();

        assert_eq!(
            out,
            "## Completed projects\n\n## Completed - 1个\n- [x] shipped v1 09:00\n"
        );
    }

    #[test]
    fn pending_count_skips_user_heading() {
        let r = Reconciler::default();
        let doc = "## Pending review notes\n- [ ] read PR\n\n## Pending - 0个\n- [ ] a\n- [ ] b\n\n## Completed - 0个\n";

        let out = r.reconcile_batch(doc, at(9, 0)).unwrap();

        assert!(out.starts_with("## Pending review notes\n- [ ] read PR\n\n## Pending - 2个\n"));
        let counts = r.section_counts(&out);
        assert_eq!(counts.pending.map(|c| c.line), Some(3));
        assert_eq!(counts.pending.map(|c| c.actual), Some(2));
    }

    #[test]
    fn heading_detection() {
        assert!(is_heading("# Title"));
        assert!(is_heading("## Completed - 1个"));
        assert!(is_heading("###### deep"));
        assert!(!is_heading("####### too deep"));
        assert!(!is_heading("#hashtag"));
        assert!(!is_heading("- [x] # not a heading"));
    }

    #[test]
    fn stated_count_parsing() {
        assert_eq!(stated_count("## Completed - 12个", "Completed"), Some(12));
        assert_eq!(stated_count("## Completed -3", "Completed"), Some(3));
        assert_eq!(stated_count("## Completed", "Completed"), None);
        assert_eq!(stated_count("## Completed - many", "Completed"), None);
    }

    #[test]
    fn render_header_uses_suffix() {
        let r = Reconciler::new(SectionConfig {
            count_suffix: String::new(),
            ..SectionConfig::default()
        });
        assert_eq!(r.render_header("Done", 7), "## Done - 7");
        assert_eq!(Reconciler::default().render_header("Completed", 2), "## Completed - 2个");
    }

    #[test]
    fn stamps() {
        assert_eq!(stamp_exact("- [x] a", at(9, 3)), "- [x] a 09:03");
        assert_eq!(stamp_exact("- [x] a 09:03", at(9, 3)), "- [x] a 09:03");
        assert_eq!(stamp_exact("- [x] a 08:00", at(9, 3)), "- [x] a 08:00 09:03");
        assert_eq!(stamp_any("- [x] a 08:00", at(9, 3)), "- [x] a 08:00");
        assert_eq!(stamp_any("- [x] a ✅ 2024-01-01", at(9, 3)), "- [x] a ✅ 2024-01-01 09:03");
        assert_eq!(stamp_any("- [x] Standup at 9:30", at(9, 3)), "- [x] Standup at 9:30 09:03");
        assert_eq!(stamp_any("- [x] Ratio 1:250", at(9, 3)), "- [x] Ratio 1:250 09:03");
    }

    // =========================================================================
    // Per-event reconciliation
    // =========================================================================

    #[test]
    fn per_event_moves_line_and_updates_count() {
        let out = Reconciler::default()
            .reconcile_event("- [x] Buy milk\n## Completed - 0个", &completed("- [x] Buy milk"), at(13, 5))
            .unwrap();
        assert_eq!(out, "## Completed - 1个\n- [x] Buy milk 13:05");
    }

    #[test]
    fn per_event_preserves_trailing_newline() {
        let out = Reconciler::default()
            .reconcile_event("- [x] a\n## Completed - 0个\n", &completed("- [x] a"), at(8, 0))
            .unwrap();
        assert_eq!(out, "## Completed - 1个\n- [x] a 08:00\n");
    }

    #[test]
    fn per_event_preserves_crlf() {
        let out = Reconciler::default()
            .reconcile_event("- [x] a\r\n## Completed - 0个\r\n", &completed("- [x] a"), at(8, 0))
            .unwrap();
        assert_eq!(out, "## Completed - 1个\r\n- [x] a 08:00\r\n");
    }

    #[test]
    fn per_event_skips_blank_lines_below_header() {
        let doc = "- [ ] keep\n- [x] done\n## Completed - 1个\n\n- [x] older 10:00\n";
        let out = Reconciler::default()
            .reconcile_event(doc, &completed("- [x] done"), at(11, 30))
            .unwrap();
        assert_eq!(
            out,
            "- [ ] keep\n## Completed - 2个\n- [x] done 11:30\n\n- [x] older 10:00\n"
        );
    }

    #[test]
    fn per_event_uses_offset_below_header() {
        let doc = "- [x] new\n## Completed - 2个\n- [x] one\n- [x] two\n";
        let out = Reconciler::default()
            .reconcile_event(doc, &completed("- [x] new"), at(7, 45))
            .unwrap();
        assert_eq!(
            out,
            "## Completed - 3个\n- [x] one\n- [x] new 07:45\n- [x] two\n"
        );
    }

    #[test]
    fn per_event_matches_trimmed_and_normalizes_indent() {
        let doc = "# Day\n    - [x] indented   \n## Completed\n";
        let out = Reconciler::default()
            .reconcile_event(doc, &completed("- [x] indented"), at(6, 0))
            .unwrap();
        assert_eq!(out, "# Day\n## Completed - 1个\n- [x] indented 06:00\n");
    }

    #[test]
    fn per_event_does_not_double_stamp() {
        let doc = "- [x] a 06:00\n## Completed - 0个\n";
        let out = Reconciler::default()
            .reconcile_event(doc, &completed("- [x] a 06:00"), at(6, 0))
            .unwrap();
        assert_eq!(out, "## Completed - 1个\n- [x] a 06:00\n");
    }

    #[test]
    fn per_event_counts_only_its_section() {
        let doc = "- [x] a\n## Completed - 9个\n- [x] b\n- [ ] stray\n## Notes\n- [x] elsewhere\n";
        let out = Reconciler::default()
            .reconcile_event(doc, &completed("- [x] a"), at(6, 0))
            .unwrap();
        assert!(out.starts_with("## Completed - 2个\n"));
        assert!(out.contains("## Notes\n- [x] elsewhere"));
    }

    #[test]
    fn per_event_updates_pending_count() {
        let doc = "## Pending - 2个\n- [ ] a\n- [x] b\n## Completed - 0个\n";
        let out = Reconciler::default()
            .reconcile_event(doc, &completed("- [x] b"), at(6, 0))
            .unwrap();
        assert_eq!(out, "## Pending - 1个\n- [ ] a\n## Completed - 1个\n- [x] b 06:00\n");
    }

    #[test]
    fn per_event_missing_header_is_an_error() {
        let result = Reconciler::default().reconcile_event(
            "- [x] a\n## Done\n",
            &completed("- [x] a"),
            at(6, 0),
        );
        assert_eq!(
            result,
            Err(ReconcileError::MissingSection("Completed".to_string()))
        );
    }

    #[test]
    fn per_event_missing_line_is_an_error() {
        let result = Reconciler::default().reconcile_event(
            "## Completed - 0个\n",
            &completed("- [x] gone"),
            at(6, 0),
        );
        assert!(matches!(result, Err(ReconcileError::LineNotFound(_))));
    }

    // =========================================================================
    // Batch reconciliation
    // =========================================================================

    #[test]
    fn batch_scenario_matches_per_event() {
        let out = Reconciler::default()
            .reconcile_batch("- [x] Buy milk\n## Completed - 0个", at(13, 5))
            .unwrap();
        assert_eq!(out, "## Completed - 1个\n- [x] Buy milk 13:05");
    }

    #[test]
    fn batch_moves_all_top_level_completed_in_order() {
        let doc = "\
## Pending - 5个
- [x] first
- [ ] open
  - [x] nested stays
- [X] second 09:15

## Completed - 1个
- [x] old 08:00
";
        let out = Reconciler::default().reconcile_batch(doc, at(10, 0)).unwrap();
        assert_eq!(
            out,
            "\
## Pending - 1个
- [ ] open
  - [x] nested stays

## Completed - 3个
- [x] old 08:00
- [x] first 10:00
- [X] second 09:15
"
        );
    }

    #[test]
    fn batch_creates_missing_header() {
        let doc = "# Today\n- [ ] open\n- [x] done\n";
        let out = Reconciler::default().reconcile_batch(doc, at(21, 9)).unwrap();
        assert_eq!(
            out,
            "# Today\n- [ ] open\n\n## Completed - 1个\n- [x] done 21:09\n"
        );
    }

    #[test]
    fn batch_without_work_or_header_is_noop() {
        let doc = "# Today\n- [ ] open\n";
        assert!(Reconciler::default().reconcile_batch(doc, at(1, 0)).is_none());
    }

    #[test]
    fn batch_fixes_stale_counts_only() {
        let doc = "## Pending - 0个\n- [ ] a\n## Completed - 7个\n- [x] b\n";
        let out = Reconciler::default().reconcile_batch(doc, at(1, 0)).unwrap();
        assert_eq!(out, "## Pending - 1个\n- [ ] a\n## Completed - 1个\n- [x] b\n");
    }

    #[test]
    fn batch_is_idempotent() {
        let docs = [
            "- [x] Buy milk\n## Completed - 0个",
            "# Today\n- [ ] open\n- [x] done\n",
            "## Pending\n- [x] a\n- [ ] b\n\n## Completed\n\n- [x] c\n## Notes\n- [x] keep\n",
        ];
        let r = Reconciler::default();
        for doc in docs {
            let once = r.reconcile_batch(doc, at(12, 0)).unwrap_or_else(|| doc.to_string());
            assert!(r.reconcile_batch(&once, at(12, 30)).is_none(), "not idempotent: {once:?}");
        }
    }

    #[test]
    fn batch_leaves_lines_below_header() {
        let doc = "## Completed - 1个\n- [x] done\n## Later\n- [x] elsewhere\n";
        assert!(Reconciler::default().reconcile_batch(doc, at(1, 0)).is_none());
    }

    // =========================================================================
    // Section counts
    // =========================================================================

    #[test]
    fn section_counts_report_truth() {
        let doc = "## Pending - 3个\n- [ ] a\n- [x] b\n## Completed - 1个\n- [x] c\n- [x] d\n";
        let counts = Reconciler::default().section_counts(doc);

        let pending = counts.pending.unwrap();
        assert_eq!(pending.line, 0);
        assert_eq!(pending.stated, Some(3));
        assert_eq!(pending.actual, 1);
        assert!(!pending.is_accurate());

        let completed = counts.completed.unwrap();
        assert_eq!(completed.stated, Some(1));
        assert_eq!(completed.actual, 2);
    }

    #[test]
    fn header_count_equals_literal_count_after_rewrite() {
        let r = Reconciler::default();
        let docs = [
            "- [x] a\n- [x] b\n## Completed - 0个\n- [ ] odd\n- [x] c\n",
            "## Pending\n- [ ] x\n  - [ ] y\n## Completed - 99个\n",
            "- [x] only\n",
        ];
        for doc in docs {
            let out = r.reconcile_batch(doc, at(3, 3)).unwrap_or_else(|| doc.to_string());
            let counts = r.section_counts(&out);
            for header in [counts.completed, counts.pending].into_iter().flatten() {
                assert!(header.is_accurate(), "inaccurate header in {out:?}");
            }
        }
    }

    #[test]
    fn reconcile_mode_parse() {
        assert_eq!(ReconcileMode::parse("batch"), Some(ReconcileMode::Batch));
        assert_eq!(ReconcileMode::parse("per-event"), Some(ReconcileMode::PerEvent));
        assert_eq!(ReconcileMode::parse("later"), None);
    }
}
