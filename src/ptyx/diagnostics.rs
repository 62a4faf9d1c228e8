//! Diagnostics reported on embedded code blocks
//!
//! Lines are 0-based document line indices, columns are 0-based character
//! offsets. Checker output uses 1-based rows and columns relative to the text it
//! was fed; [`CheckerMessage::into_diagnostic`] converts it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A problem found in a code block, placed on the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// Rule code reported by the checker. `None` for directive errors and
    /// checker syntax errors.
    pub code: Option<String>,
}

impl Diagnostic {
    /// A diagnostic on a single line.
    pub fn on_line(line: usize, columns: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            start_line: line,
            start_column: columns.start,
            end_line: line,
            end_column: columns.end,
            code: None,
        }
    }

    /// Move the diagnostic down by `offset` lines.
    pub fn shifted(mut self, offset: usize) -> Self {
        self.start_line += offset;
        self.end_line += offset;
        self
    }
}

impl fmt::Display for Diagnostic {
    /// `line:column: [code] message`, 1-based for humans.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: ", self.start_line + 1, self.start_column + 1)?;
        if let Some(code) = &self.code {
            write!(f, "{} ", code)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Row and column as the checker reports them, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CheckerLocation {
    pub row: usize,
    pub column: usize,
}

/// One entry of the checker's JSON output. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckerMessage {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
    pub location: CheckerLocation,
    pub end_location: CheckerLocation,
}

impl CheckerMessage {
    /// Place the message on the document, given the line index of the block's
    /// opening delimiter. Row 1 of the block text is the line after it.
    pub fn into_diagnostic(self, delimiter_line: usize) -> Diagnostic {
        Diagnostic {
            message: self.message,
            start_line: self.location.row,
            start_column: self.location.column.saturating_sub(1),
            end_line: self.end_location.row,
            end_column: self.end_location.column.saturating_sub(1),
            code: self.code,
        }
        .shifted(delimiter_line)
    }
}

/// Parse the checker's JSON array.
pub fn parse_checker_output(stdout: &str) -> Result<Vec<CheckerMessage>, serde_json::Error> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(stdout)
}
