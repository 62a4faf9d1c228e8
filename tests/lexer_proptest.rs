//! Property-based tests for the incremental styler
//!
//! Documents are generated from fragments of the ptyx syntax so that every mode
//! is reached, plus arbitrary unicode text for coverage.

use proptest::prelude::*;
use ptyx_lexer::ptyx::lexing::{IncrementalStyler, LexState, StyleHost, StyledBuffer};
use ptyx_lexer::ptyx::registry::GrammarRegistry;
use ptyx_lexer::StyleTag;
use std::sync::Arc;

const FRAGMENTS: &[&str] = &[
    "....\n", "#PYTHON\n", "#END_PYTHON\n", "#END\n", "#IF{", "#{", "?{", "}", "'", "\"",
    "'''", "\"\"\"", "x", "len", "let", " ", "  ", "\n", "3.14", "42", "===\n", "seed = 3",
    "<<<\n", ">>>\n", "-- a.ex\n", "!-- b.ex\n", "-- DIR: q\n", "+ ", "- ", "! ", "% note",
    "\\frac", "\\%", "# comment", "OR\n", "#a[1]", "#ELSE", "é", "→", "\\'", "\\\\", "\r\n",
    "#IF{a +\n", "b}\n",
];

fn styler() -> IncrementalStyler {
    IncrementalStyler::new(Arc::new(GrammarRegistry::ptyx())).expect("stock grammar compiles")
}

fn ptyx_document() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..60).prop_map(|parts| parts.concat())
}

/// A document and a char-aligned range inside it.
fn document_and_range() -> impl Strategy<Value = (String, usize, usize)> {
    ptyx_document().prop_flat_map(|text| {
        let len = text.len();
        (Just(text), 0..=len, 0..=len).prop_map(|(text, a, b)| {
            let (mut start, mut end) = (a.min(b), a.max(b));
            while !text.is_char_boundary(start) {
                start -= 1;
            }
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            (text, start, end)
        })
    })
}

/// Per-byte styles of a buffer.
fn painted(buffer: &StyledBuffer) -> Vec<Option<StyleTag>> {
    (0..buffer.len()).map(|i| buffer.style_at(i)).collect()
}

fn full_styles(text: &str) -> Vec<Option<StyleTag>> {
    let mut buffer = StyledBuffer::new(text);
    styler().style_range(&mut buffer, 0, text.len());
    painted(&buffer)
}

/// State at every line start, from one run over the whole text.
fn line_start_states(styler: &IncrementalStyler, text: &str) -> Vec<(usize, LexState)> {
    let mut state = LexState::default();
    let mut states = Vec::new();
    for lexeme in styler.scanner().lexemes(text, 0..text.len()) {
        state = styler.machine().step(lexeme.text, state);
        if lexeme.text.ends_with('\n') {
            states.push((lexeme.end(), state));
        }
    }
    states
}

/// Offset just past the line holding `pos`.
fn line_end_after(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i + 1)
}

fn floor_boundary(text: &str, mut pos: usize) -> usize {
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

proptest! {
    #[test]
    fn test_spans_cover_whole_document(text in "\\PC{0,200}") {
        let spans = styler().style_text(&text);
        prop_assert_eq!(spans.iter().map(|s| s.len).sum::<usize>(), text.len());
    }

    #[test]
    fn test_spans_cover_requested_range((text, start, end) in document_and_range()) {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new(text.as_str());
        styler.style_range(&mut buffer, 0, start);
        let pass = styler.style_range(&mut buffer, start, end);
        prop_assert_eq!(pass.start, start);
        prop_assert_eq!(pass.len(), end - start);
    }

    #[test]
    fn test_emitted_tags_match_tracked_mode(text in ptyx_document()) {
        let styler = styler();
        let mut state = LexState::default();
        for lexeme in styler.scanner().lexemes(&text, 0..text.len()) {
            let next = styler.machine().step(lexeme.text, state);
            if next.mode == state.mode {
                prop_assert!(
                    next.mode.admits(next.style),
                    "{:?} emitted in {} for {:?}",
                    next.style, next.mode, lexeme.text
                );
            } else {
                // Opening and closing lexemes carry the style of either side
                prop_assert!(
                    state.mode.admits(next.style) || next.mode.admits(next.style),
                    "{:?} emitted between {} and {} for {:?}",
                    next.style, state.mode, next.mode, lexeme.text
                );
            }
            state = next;
        }
    }

    #[test]
    fn test_cold_requests_recover_line_start_states(
        text in ptyx_document(),
        picks in prop::collection::vec((0usize..1000, 0usize..1000), 1..5),
    ) {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new(text.as_str());
        let expected = full_styles(&text);

        for (a, b) in picks {
            let start = floor_boundary(&text, a % (text.len() + 1));
            let end = line_end_after(&text, floor_boundary(&text, b % (text.len() + 1)).max(start));
            styler.style_range(&mut buffer, start, end);
            let styles = painted(&buffer);
            prop_assert_eq!(&styles[start..end], &expected[start..end]);
        }
        for (pos, state) in line_start_states(&styler, &text) {
            if let Some(cached) = styler.checkpoint(pos) {
                prop_assert_eq!(cached, state, "checkpoint at {}", pos);
            }
        }
    }

    #[test]
    fn test_edit_then_restyle_matches_full_styling(
        text in ptyx_document(),
        inserted in ptyx_document(),
        at in 0usize..1000,
        removed in 0usize..24,
        forget in any::<bool>(),
    ) {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new(text.as_str());
        styler.style_range(&mut buffer, 0, text.len());

        let start = floor_boundary(&text, at % (text.len() + 1));
        let end = floor_boundary(&text, (start + removed).min(text.len())).max(start);
        buffer.edit(start..end, &inserted);
        if forget {
            styler.invalidate_from(start);
        } else {
            styler.edited(start..end, inserted.len());
        }

        // Restyle the edited lines, then follow the styler until it settles
        let line_start = buffer.text()[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = line_end_after(buffer.text(), start + inserted.len());
        let mut pass = styler.style_range(&mut buffer, line_start, line_end);
        while let Some(from) = pass.restyle_from {
            let to = line_end_after(buffer.text(), from);
            pass = styler.style_range(&mut buffer, from, to);
        }

        let edited = buffer.text().to_string();
        prop_assert_eq!(painted(&buffer), full_styles(&edited));
        for (pos, state) in line_start_states(&styler, &edited) {
            if let Some(cached) = styler.checkpoint(pos) {
                prop_assert_eq!(cached, state, "checkpoint at {}", pos);
            }
        }
    }

    #[test]
    fn test_restyling_is_idempotent((text, start, end) in document_and_range()) {
        let mut styler = styler();
        let mut buffer = StyledBuffer::new(text.as_str());
        styler.style_range(&mut buffer, 0, text.len());

        let first = styler.style_range(&mut buffer, start, end);
        let second = styler.style_range(&mut buffer, start, end);
        prop_assert_eq!(first.spans, second.spans);
        prop_assert_eq!(first.end_state, second.end_state);
    }

    #[test]
    fn test_range_restyle_matches_full_styling(text in ptyx_document(), a in 0usize..1000, b in 0usize..1000) {
        let mut styler = styler();
        let mut full = StyledBuffer::new(text.as_str());
        styler.style_range(&mut full, 0, text.len());
        let expected = painted(&full);

        // Ranges end on a line boundary so a string given up later on the line is seen
        let line_ends: Vec<usize> = text
            .match_indices('\n')
            .map(|(i, _)| i + 1)
            .chain(std::iter::once(text.len()))
            .collect();
        let end = line_ends[b % line_ends.len()];
        let mut start = if end == 0 { 0 } else { a % (end + 1) };
        while !text.is_char_boundary(start) {
            start -= 1;
        }

        let mut partial = full.clone();
        partial.start_styling(start);
        partial.set_styling(end - start, ptyx_lexer::StyleTag::Default);
        styler.style_range(&mut partial, start, end);
        prop_assert_eq!(painted(&partial), expected);
    }
}
