//! Embedded code block extraction
//!
//! A line made of four or more dots (surrounding blanks ignored) opens a script
//! block, and the next such line closes it. A block still open at the end of the
//! document is not a block.
//!
//! Line indices are 0-based. A block records the indices of its two delimiter
//! lines; its content is the lines strictly between them.

use once_cell::sync::Lazy;
use regex::Regex;

static DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.{4,}$").expect("delimiter pattern is valid"));

/// Dots written back when delimiters are normalized.
pub const CANONICAL_DELIMITER_LENGTH: usize = 12;

pub fn is_block_delimiter(line: &str) -> bool {
    DELIMITER.is_match(line.trim())
}

/// One `....` block of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Line index of the opening delimiter.
    pub start: usize,
    /// Line index of the closing delimiter.
    pub end: usize,
    /// Content lines, each with its line ending.
    pub lines: Vec<String>,
}

impl CodeBlock {
    /// Line index of the first content line.
    pub fn first_line(&self) -> usize {
        self.start + 1
    }

    pub fn text(&self) -> String {
        self.lines.concat()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// All closed blocks of `document`, in order.
pub fn extract_blocks(document: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<CodeBlock> = None;

    for (index, line) in document.split_inclusive('\n').enumerate() {
        if is_block_delimiter(line) {
            match open.take() {
                Some(mut block) => {
                    block.end = index;
                    blocks.push(block);
                }
                None => {
                    open = Some(CodeBlock {
                        start: index,
                        end: index,
                        lines: Vec::new(),
                    })
                }
            }
        } else if let Some(block) = open.as_mut() {
            block.lines.push(line.to_string());
        }
    }

    blocks
}

/// Rebuild `document`, replacing the content of every closed block with
/// `rewrite(block)` and normalizing its delimiters to `delimiter_length` dots.
///
/// A newline follows the opening delimiter unless the new content starts with
/// one, and the content is terminated by a newline before the closing delimiter.
/// Lines outside blocks are copied as they are.
pub fn rewrite_blocks<F>(document: &str, delimiter_length: usize, mut rewrite: F) -> String
where
    F: FnMut(&CodeBlock) -> String,
{
    let lines: Vec<&str> = document.split_inclusive('\n').collect();
    let delimiter = ".".repeat(delimiter_length.max(4));
    let mut out = String::with_capacity(document.len());
    let mut cursor = 0;

    for block in extract_blocks(document) {
        for line in &lines[cursor..block.start] {
            out.push_str(line);
        }

        let content = rewrite(&block);
        out.push_str(&delimiter);
        if !content.starts_with('\n') {
            out.push('\n');
        }
        out.push_str(&content);
        if !content.is_empty() && !content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&delimiter);
        out.push_str(line_ending(lines[block.end]));

        cursor = block.end + 1;
    }

    for line in &lines[cursor..] {
        out.push_str(line);
    }
    out
}

fn line_ending(line: &str) -> &str {
    let content = line.trim_end_matches(['\r', '\n']);
    &line[content.len()..]
}
