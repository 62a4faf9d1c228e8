//! Checker and formatter adapters
//!
//! Both run an [`ExternalTool`] over one block at a time and map the result back
//! onto the document. Neither ever fails: a checker that can't run or prints
//! something other than JSON contributes no diagnostics, and a formatter that
//! fails leaves its block as it was.

use crate::ptyx::blocks::directive::rewrite_for_checker;
use crate::ptyx::blocks::extractor::{
    extract_blocks, rewrite_blocks, CodeBlock, CANONICAL_DELIMITER_LENGTH,
};
use crate::ptyx::blocks::sentinel::DirectiveQueue;
use crate::ptyx::blocks::tool::ExternalTool;
use crate::ptyx::diagnostics::{parse_checker_output, Diagnostic};
use tracing::{debug, error, warn};

/// Identifier standing in for `let` directives while a formatter runs.
pub const DEFAULT_SENTINEL: &str = "__PTYX_LET_DIRECTIVE__";

pub struct BlockChecker<T> {
    tool: T,
}

impl<T: ExternalTool> BlockChecker<T> {
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    /// Diagnostics for every block of `document`, ordered by position.
    pub fn check_document(&self, document: &str) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = extract_blocks(document)
            .iter()
            .flat_map(|block| self.check_block(block))
            .collect();
        diagnostics.sort_by_key(|d| (d.start_line, d.start_column));
        diagnostics
    }

    /// Malformed directives are reported here and replaced by `pass`, so the
    /// checker still sees the rest of the block with unchanged line numbers.
    pub fn check_block(&self, block: &CodeBlock) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut source = String::new();

        for (row, line) in block.lines.iter().enumerate() {
            let content = line.trim_end_matches(['\r', '\n']);
            let (rewritten, defect) = rewrite_for_checker(content);
            if let Some(defect) = defect {
                diagnostics.push(
                    Diagnostic::on_line(row, defect.columns, defect.message)
                        .shifted(block.first_line()),
                );
            }
            source.push_str(&rewritten);
            source.push('\n');
        }

        let output = match self.tool.run(&source) {
            Ok(output) => output,
            Err(e) => {
                error!(block_start = block.start, "checker failed to run: {}", e);
                return diagnostics;
            }
        };

        // The checker exits non-zero when it reports problems, so the status
        // alone only means failure when nothing was reported
        if !output.success && output.stdout.trim().is_empty() {
            error!(
                block_start = block.start,
                stderr = %output.stderr.trim(),
                "checker failed without output"
            );
            return diagnostics;
        }

        match parse_checker_output(&output.stdout) {
            Ok(messages) => {
                debug!(block_start = block.start, count = messages.len(), "checker messages");
                diagnostics.extend(messages.into_iter().map(|m| m.into_diagnostic(block.start)));
            }
            Err(e) => {
                error!(
                    block_start = block.start,
                    stderr = %output.stderr.trim(),
                    "checker output is not valid JSON: {}",
                    e
                );
            }
        }
        diagnostics
    }
}

pub struct BlockFormatter<T> {
    tool: T,
    sentinel: String,
    delimiter_length: usize,
}

impl<T: ExternalTool> BlockFormatter<T> {
    pub fn new(tool: T) -> Self {
        Self {
            tool,
            sentinel: DEFAULT_SENTINEL.to_string(),
            delimiter_length: CANONICAL_DELIMITER_LENGTH,
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_delimiter_length(mut self, length: usize) -> Self {
        self.delimiter_length = length;
        self
    }

    /// `document` with every block's content reformatted.
    pub fn format_document(&self, document: &str) -> String {
        rewrite_blocks(document, self.delimiter_length, |block| {
            let text = block.text();
            self.format_block(&text).unwrap_or(text)
        })
    }

    /// Reformat one block's content, `None` if the formatter failed.
    pub fn format_block(&self, text: &str) -> Option<String> {
        let mut queue = DirectiveQueue::new(self.sentinel.as_str());
        let input = queue.substitute(text);

        match self.tool.run(&input) {
            Ok(output) if output.success => queue.restore(&output.stdout),
            Ok(output) => {
                warn!(stderr = %output.stderr.trim(), "formatter rejected block, keeping it as is");
                None
            }
            Err(e) => {
                warn!("formatter failed to run, keeping block as is: {}", e);
                None
            }
        }
    }
}
