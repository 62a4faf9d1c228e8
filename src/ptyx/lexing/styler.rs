//! Incremental styler
//!
//! Restyles a byte range of a host buffer. The state active just before the range
//! comes from a cache of the exact [`LexState`] at every line start crossed by
//! earlier passes: the pass resumes at the closest checkpoint at or before the
//! line holding `start` (offset 0 when there is none), replays the lexemes up to
//! `start` without painting, and paints from there.
//!
//! Edits make the cache stale past the edited offset. Hosts report them either
//! with [`IncrementalStyler::edited`], which keeps the old states shifted with the
//! text so restyling can stop once it catches up with them, or with
//! [`IncrementalStyler::invalidate_from`], which forgets them.

use crate::ptyx::lexing::host::{StyleHost, StyledBuffer};
use crate::ptyx::lexing::scanner::{Scanner, ScannerError};
use crate::ptyx::lexing::state_machine::{LexState, StateMachine};
use crate::ptyx::registry::GrammarRegistry;
use crate::ptyx::styling::{Mode, StyleTag};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

/// A run of `len` bytes painted with `style`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleSpan {
    pub len: usize,
    pub style: StyleTag,
}

impl StyleSpan {
    pub const fn new(len: usize, style: StyleTag) -> Self {
        Self { len, style }
    }
}

/// Result of one styling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePass {
    /// Byte offset of the first span.
    pub start: usize,
    pub spans: Vec<StyleSpan>,
    /// State after the last lexeme of the range.
    pub end_state: LexState,
    /// Set when the text after the range may have been styled under another
    /// state than `end_state` and must be restyled from this offset.
    pub restyle_from: Option<usize>,
}

impl StylePass {
    pub fn len(&self) -> usize {
        self.spans.iter().map(|s| s.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Merge adjacent spans carrying the same style.
pub fn coalesce(spans: &[StyleSpan]) -> Vec<StyleSpan> {
    let mut merged: Vec<StyleSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.style == span.style => last.len += span.len,
            _ => merged.push(*span),
        }
    }
    merged
}

pub struct IncrementalStyler {
    scanner: Scanner,
    machine: StateMachine,
    /// Exact states at line starts of the current text.
    checkpoints: BTreeMap<usize, LexState>,
    /// State the host's styles after each line start were painted from. Kept
    /// across edits, shifted with the text.
    painted: BTreeMap<usize, LexState>,
}

impl IncrementalStyler {
    pub fn new(registry: Arc<GrammarRegistry>) -> Result<Self, ScannerError> {
        let scanner = Scanner::new(&registry)?;
        Ok(Self {
            scanner,
            machine: StateMachine::new(registry),
            checkpoints: BTreeMap::new(),
            painted: BTreeMap::new(),
        })
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Forget every state recorded past `pos`. Call with the start of an edit
    /// when its extent is unknown.
    pub fn invalidate_from(&mut self, pos: usize) {
        self.checkpoints.split_off(&pos.saturating_add(1));
        self.painted.split_off(&pos);
    }

    /// Account for `range` of the text being replaced by `inserted` bytes.
    pub fn edited(&mut self, range: Range<usize>, inserted: usize) {
        let removed_end = range.end.max(range.start);
        self.checkpoints.split_off(&range.start.saturating_add(1));

        // Painted states inside the replaced text are dropped, later ones move
        let moved = self.painted.split_off(&range.start);
        for (pos, state) in moved {
            if pos >= removed_end {
                self.painted
                    .insert(range.start + inserted + (pos - removed_end), state);
            }
        }
    }

    /// Cached state at the start of the line beginning at `pos`.
    pub fn checkpoint(&self, pos: usize) -> Option<LexState> {
        self.checkpoints.get(&pos).copied()
    }

    /// Style a whole document from scratch.
    pub fn style_text(&mut self, text: &str) -> Vec<StyleSpan> {
        self.checkpoints.clear();
        self.painted.clear();
        let mut buffer = StyledBuffer::new(text);
        self.style_range(&mut buffer, 0, text.len()).spans
    }

    /// Restyle `start..end` of `host` and paint the result into it.
    ///
    /// A lexeme crossing `end` is classified whole and painted up to `end`.
    pub fn style_range<H: StyleHost>(&mut self, host: &mut H, start: usize, end: usize) -> StylePass {
        let (start, end) = {
            let text = host.text();
            let end = floor_char_boundary(text, end.min(text.len()));
            (floor_char_boundary(text, start.min(end)), end)
        };
        let text_len = host.text().len();
        let at_line_start = start == 0 || host.text().as_bytes()[start - 1] == b'\n';

        let (resume, mut state) = self.seed(host.text(), start);
        let mut spans: Vec<StyleSpan> = Vec::new();
        let mut string_start = (state.mode == Mode::PythonString).then_some(0);
        // `end` is a line start and the styles after it were painted from `state`
        let mut settled = false;

        for lexeme in self.scanner.lexemes(host.text(), resume..text_len) {
            if lexeme.start >= end {
                break;
            }
            let before = state;
            state = self.machine.step(lexeme.text, state);
            if at_line_start && lexeme.start == start {
                self.painted.insert(start, before);
            }

            if state.mode == Mode::PythonString && before.mode != Mode::PythonString {
                string_start = Some(spans.len());
            }

            let (lo, hi) = (lexeme.start.max(start), lexeme.end().min(end));
            if hi > lo {
                spans.push(StyleSpan::new(hi - lo, state.style));

                if state.style == StyleTag::UnclosedString {
                    // Flag the whole literal, not only the newline that gave it up
                    let from = string_start.unwrap_or(spans.len() - 1);
                    for span in &mut spans[from..] {
                        span.style = StyleTag::UnclosedString;
                    }
                }
            }
            if state.mode != Mode::PythonString {
                string_start = None;
            }

            if lexeme.text.ends_with('\n') {
                let line_start = lexeme.end();
                self.checkpoints.insert(line_start, state);
                if line_start == end {
                    settled = self.painted.get(&line_start) == Some(&state);
                } else if line_start > start && line_start < end {
                    self.painted.insert(line_start, state);
                }
            }
        }

        host.start_styling(start);
        for span in &spans {
            host.set_styling(span.len, span.style);
        }

        let restyle_from = (end > start && end < text_len && !settled).then_some(end);

        StylePass {
            start,
            spans,
            end_state: state,
            restyle_from,
        }
    }

    /// Offset to resume scanning from, and the state there.
    fn seed(&self, text: &str, start: usize) -> (usize, LexState) {
        let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
        self.checkpoints
            .range(..=line_start)
            .next_back()
            .map_or((0, LexState::default()), |(pos, state)| (*pos, *state))
    }
}

fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styler() -> IncrementalStyler {
        IncrementalStyler::new(Arc::new(GrammarRegistry::ptyx())).unwrap()
    }

    #[test]
    fn test_coalesce() {
        let spans = [
            StyleSpan::new(1, StyleTag::Tag),
            StyleSpan::new(2, StyleTag::Tag),
            StyleSpan::new(1, StyleTag::Default),
        ];
        assert_eq!(
            coalesce(&spans),
            vec![StyleSpan::new(3, StyleTag::Tag), StyleSpan::new(1, StyleTag::Default)]
        );
    }

    #[test]
    fn test_style_text_covers_input() {
        let text = "#IF{a}\n....\nx = 'é'\n....\n";
        let spans = styler().style_text(text);
        assert_eq!(spans.iter().map(|s| s.len).sum::<usize>(), text.len());
    }

    #[test]
    fn test_checkpoints_recorded_at_line_starts() {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new("....\nx\n");
        styler.style_range(&mut buffer, 0, 7);
        assert_eq!(styler.checkpoint(5).map(|s| s.mode), Some(Mode::PythonBlock));
        assert_eq!(styler.checkpoint(7).map(|s| s.mode), Some(Mode::PythonBlock));
        styler.invalidate_from(5);
        assert!(styler.checkpoint(5).is_some());
        assert!(styler.checkpoint(7).is_none());
    }

    #[test]
    fn test_mid_line_request_replays_from_line_start() {
        let mut styler = styler();
        let text = "....\nx = 'abc'\n";
        let mut buffer = StyledBuffer::new(text);
        styler.style_range(&mut buffer, 0, text.len());

        // Start inside the string: the checkpoint at the line start knows the mode
        let pass = styler.style_range(&mut buffer, 11, 14);
        assert_eq!(pass.len(), 3);
        assert_eq!(
            coalesce(&pass.spans),
            vec![StyleSpan::new(3, StyleTag::SingleQuoteString)]
        );
    }

    /// Per-byte styles of `text` styled from scratch.
    fn styled(text: &str) -> StyledBuffer {
        let mut buffer = StyledBuffer::new(text);
        styler().style_range(&mut buffer, 0, text.len());
        buffer
    }

    #[test]
    fn test_cold_request_replays_from_document_start() {
        let text = "#IF{a +\nb}\nc\n";
        let mut buffer = StyledBuffer::new(text);
        let pass = styler().style_range(&mut buffer, 8, text.len());
        assert_eq!(
            coalesce(&pass.spans),
            vec![
                StyleSpan::new(1, StyleTag::PythonBody),
                StyleSpan::new(1, StyleTag::Tag),
                StyleSpan::new(3, StyleTag::Default),
            ]
        );
        assert_eq!(buffer.styles(8..13), styled(text).styles(8..13));
    }

    #[test]
    fn test_expression_spanning_lines_after_invalidation() {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new("x\n#{a +\nb}\nc\n");
        let len = buffer.len();
        styler.style_range(&mut buffer, 0, len);

        buffer.edit(0..1, "y");
        styler.invalidate_from(0);
        styler.style_range(&mut buffer, 0, 2);
        styler.style_range(&mut buffer, 8, 11);
        assert_eq!(
            buffer.styles(8..11),
            &[
                Some(StyleTag::PythonBody),
                Some(StyleTag::Tag),
                Some(StyleTag::Default)
            ]
        );
        assert_eq!(styler.checkpoint(8).map(|s| s.mode), Some(Mode::Expression));
    }

    #[test]
    fn test_flipped_block_delimiter_requests_restyle() {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new("a\nb\n....\nc\n");
        let len = buffer.len();
        styler.style_range(&mut buffer, 0, len);

        // The old opening delimiter now closes the block opened above it
        buffer.edit(0..0, "....\n");
        styler.invalidate_from(0);
        let pass = styler.style_range(&mut buffer, 0, 13);
        assert_eq!(pass.end_state.mode, Mode::Default);
        assert_eq!(pass.restyle_from, Some(13));

        let len = buffer.len();
        let rest = styler.style_range(&mut buffer, 13, len);
        assert_eq!(rest.restyle_from, None);
        assert_eq!(
            buffer.styles(0..len),
            styled("....\na\nb\n....\nc\n").styles(0..len)
        );
    }

    #[test]
    fn test_flipped_mode_detected_at_line_start() {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new("a\n....\nc\n");
        let len = buffer.len();
        styler.style_range(&mut buffer, 0, len);

        buffer.edit(0..0, "....\n");
        styler.edited(0..0, 5);
        let pass = styler.style_range(&mut buffer, 0, 12);
        assert_eq!(pass.end_state.mode, Mode::Default);
        assert_eq!(pass.restyle_from, Some(12));
    }

    #[test]
    fn test_restyle_stops_once_painted_state_matches() {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new("....\na = 1\n....\nb\n");
        let len = buffer.len();
        styler.style_range(&mut buffer, 0, len);

        buffer.edit(9..10, "22");
        styler.edited(9..10, 2);
        let pass = styler.style_range(&mut buffer, 5, 12);
        assert_eq!(pass.restyle_from, None);
        let len = buffer.len();
        assert_eq!(
            buffer.styles(0..len),
            styled("....\na = 22\n....\nb\n").styles(0..len)
        );
    }

    #[test]
    fn test_invalidate_from_saturates() {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new("....\nx\n");
        styler.style_range(&mut buffer, 0, 7);
        styler.invalidate_from(usize::MAX);
        assert!(styler.checkpoint(7).is_some());
    }

    #[test]
    fn test_opening_quote_requests_restyle() {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new("....\na = 1\nb = 2\n");
        let len = buffer.len();
        styler.style_range(&mut buffer, 0, len);

        // Open a triple-quoted string on the second line
        buffer.edit(5..5, "'''");
        styler.invalidate_from(5);
        let line_end = buffer.text().find("1\n").unwrap() + 2;
        let pass = styler.style_range(&mut buffer, 5, line_end);
        assert_eq!(pass.end_state.mode, Mode::PythonString);
        assert_eq!(pass.restyle_from, Some(line_end));
    }

    #[test]
    fn test_unchanged_restyle_requests_nothing_more() {
        let mut styler = styler();
        let text = "....\na = 1\nb = 2\n";
        let mut buffer = StyledBuffer::new(text);
        styler.style_range(&mut buffer, 0, text.len());
        let pass = styler.style_range(&mut buffer, 5, 11);
        assert_eq!(pass.restyle_from, None);
    }
}
