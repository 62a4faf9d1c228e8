//! Sentinel substitution for `let` directives
//!
//! External formatters reject `let` directives, so each directive line is
//! swapped for a sentinel identifier (a valid expression statement) and queued.
//! After formatting, sentinel lines are replaced in order by the queued
//! directives, re-indented like the sentinel line and with normalized spacing.
//!
//! A queue belongs to one block round trip. Formatting blocks concurrently needs
//! one queue per block.

use crate::ptyx::blocks::directive::{indentation, is_directive_line};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use tracing::warn;

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+").expect("blank run pattern is valid"));
static COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*,[ \t]*").expect("comma pattern is valid"));

/// Collapse blank runs to one space and write commas as `, `.
pub fn normalize_directive(directive: &str) -> String {
    let collapsed = BLANK_RUN.replace_all(directive.trim(), " ");
    COMMA.replace_all(&collapsed, ", ").into_owned()
}

#[derive(Debug, Clone)]
pub struct DirectiveQueue {
    sentinel: String,
    directives: VecDeque<String>,
}

impl DirectiveQueue {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
            directives: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Replace every directive line of `block` with the sentinel and queue it.
    pub fn substitute(&mut self, block: &str) -> String {
        map_lines(block, |line| {
            if is_directive_line(line) {
                let indent = indentation(line);
                self.directives
                    .push_back(line[indent.len()..].trim_end().to_string());
                format!("{}{}", indent, self.sentinel)
            } else {
                line.to_string()
            }
        })
    }

    /// Put the queued directives back in place of the sentinel lines.
    ///
    /// Returns `None` when the sentinel lines don't match the queue one to one,
    /// e.g. when the tool dropped or duplicated a line.
    pub fn restore(&mut self, formatted: &str) -> Option<String> {
        let mut missing = false;
        let restored = map_lines(formatted, |line| {
            if line.trim() != self.sentinel {
                return line.to_string();
            }
            match self.directives.pop_front() {
                Some(directive) => {
                    format!("{}{}", indentation(line), normalize_directive(&directive))
                }
                None => {
                    missing = true;
                    line.to_string()
                }
            }
        });

        if missing || !self.directives.is_empty() {
            warn!(
                left_over = self.directives.len(),
                missing, "sentinel lines do not match the queued directives"
            );
            self.directives.clear();
            return None;
        }
        Some(restored)
    }
}

/// Apply `f` to every line of `text`, keeping line endings as they are.
fn map_lines(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        out.push_str(&f(content));
        out.push_str(&line[content.len()..]);
    }
    out
}
