//! Anchor location
//!
//! Finds the handler-entry line in connector text with a line-level regex.
//! The target language is never parsed: the anchor is a textual contract of
//! leading indentation, the entry keyword sequence, a non-empty parameter
//! list and a colon, then the line terminator.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PatchError, Result};

/// Keyword sequence used when none is configured
pub const DEFAULT_ANCHOR_ENTRY: &str = "def handle_action";

static DEFAULT_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&anchor_pattern(DEFAULT_ANCHOR_ENTRY)).unwrap());

fn anchor_pattern(entry: &str) -> String {
    format!(r"(?m)^([ \t]+){}\([^)]+\):(\r?\n)", regex::escape(entry))
}

/// Where generated code is inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorInfo {
    /// Byte offset just past the anchor line's terminator
    pub insertion_offset: usize,

    /// Leading whitespace of the anchor line
    pub indent_unit: String,

    /// Terminator of the anchor line, `\n` or `\r\n`
    pub line_ending: String,

    /// 1-based line number of the anchor
    pub line: usize,
}

/// Compiled anchor matcher
#[derive(Debug, Clone)]
pub struct AnchorLocator {
    entry: String,
    regex: Regex,
}

impl AnchorLocator {
    pub fn new(entry: &str) -> Self {
        let regex = Regex::new(&anchor_pattern(entry)).unwrap_or_else(|_| DEFAULT_ANCHOR.clone());
        Self {
            entry: entry.to_string(),
            regex,
        }
    }

    /// Locate the anchor
    ///
    /// With `strict` unset the first match wins; with it set, more than one
    /// match is an error.
    pub fn locate(&self, source: &str, strict: bool) -> Result<AnchorInfo> {
        let mut matches = self.regex.captures_iter(source);

        let Some(first) = matches.next() else {
            return Err(PatchError::AnchorNotFound {
                pattern: self.describe(),
                hint: self.diagnose(source),
            });
        };

        if strict {
            let rest: Vec<usize> = matches
                .filter_map(|caps| caps.get(0))
                .map(|m| line_of(source, m.start()))
                .collect();
            if !rest.is_empty() {
                let mut lines = Vec::with_capacity(rest.len() + 1);
                if let Some(m) = first.get(0) {
                    lines.push(line_of(source, m.start()));
                }
                lines.extend(rest);
                return Err(PatchError::AmbiguousAnchor {
                    pattern: self.describe(),
                    count: lines.len(),
                    lines,
                });
            }
        }

        let whole = first.get(0).ok_or_else(|| PatchError::AnchorNotFound {
            pattern: self.describe(),
            hint: "empty match".to_string(),
        })?;
        let indent = first.get(1).map(|m| m.as_str()).unwrap_or_default();
        let line_ending = first.get(2).map_or("\n", |m| m.as_str());

        Ok(AnchorInfo {
            insertion_offset: whole.end(),
            indent_unit: indent.to_string(),
            line_ending: line_ending.to_string(),
            line: line_of(source, whole.start()),
        })
    }

    /// Number of anchor lines in the source
    pub fn count(&self, source: &str) -> usize {
        self.regex.find_iter(source).count()
    }

    fn describe(&self) -> String {
        format!("<indent>{}(...):", self.entry)
    }

    /// Explain why the nearest candidate line did not qualify
    fn diagnose(&self, source: &str) -> String {
        for (idx, line) in source.split('\n').enumerate() {
            let trimmed = line.trim_start();
            if !trimmed.starts_with(&self.entry) {
                continue;
            }

            let reason = if trimmed.len() == line.len() {
                "no leading indentation"
            } else if !line.trim_end().ends_with(':') {
                "line does not end with ':'"
            } else if trimmed.contains("()") {
                "empty parameter list"
            } else if idx + 1 == source.split('\n').count() {
                "missing line terminator"
            } else {
                "unexpected text around the parameter list"
            };

            return format!("line {} `{}`: {}", idx + 1, line.trim_end(), reason);
        }

        format!("no line contains `{}`", self.entry)
    }
}

impl Default for AnchorLocator {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR_ENTRY)
    }
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}
