//! Host buffer abstraction
//!
//! The styler writes styles into whatever text widget hosts the document. A host
//! exposes the text, remembers the style painted on every byte, and accepts new
//! styling through a cursor (`start_styling` then consecutive `set_styling`),
//! the way editor components usually do.

use crate::ptyx::styling::StyleTag;
use std::ops::Range;

/// A text buffer that stores one style per byte.
pub trait StyleHost {
    fn text(&self) -> &str;

    /// Style currently painted at byte `pos`, if any.
    fn style_at(&self, pos: usize) -> Option<StyleTag>;

    /// Move the styling cursor to byte `pos`.
    fn start_styling(&mut self, pos: usize);

    /// Paint `len` bytes from the cursor and advance it.
    fn set_styling(&mut self, len: usize, style: StyleTag);
}

/// In-memory host used by the CLI and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledBuffer {
    text: String,
    styles: Vec<Option<StyleTag>>,
    cursor: usize,
}

impl StyledBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let styles = vec![None; text.len()];
        Self {
            text,
            styles,
            cursor: 0,
        }
    }

    /// Replace `range` with `replacement`. Inserted bytes are left unstyled,
    /// bytes after the edit keep their styles and shift with the text.
    pub fn edit(&mut self, range: Range<usize>, replacement: &str) {
        self.text.replace_range(range.clone(), replacement);
        self.styles
            .splice(range, std::iter::repeat(None).take(replacement.len()));
    }

    /// Styles of `range`, `None` where nothing was painted yet.
    pub fn styles(&self, range: Range<usize>) -> &[Option<StyleTag>] {
        &self.styles[range]
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl StyleHost for StyledBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn style_at(&self, pos: usize) -> Option<StyleTag> {
        self.styles.get(pos).copied().flatten()
    }

    fn start_styling(&mut self, pos: usize) {
        self.cursor = pos.min(self.styles.len());
    }

    fn set_styling(&mut self, len: usize, style: StyleTag) {
        let end = (self.cursor + len).min(self.styles.len());
        for slot in &mut self.styles[self.cursor..end] {
            *slot = Some(style);
        }
        self.cursor = end;
    }
}
