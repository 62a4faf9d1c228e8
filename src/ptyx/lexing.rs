//! Lexer
//!
//! Styles ptyx documents for an editor, incrementally.
//!
//! The pipeline consists of:
//! 1. Tokenization with one prioritized alternation regex ./lexing/scanner.rs
//! 2. A state machine assigning each lexeme a style and the next mode ./lexing/state_machine.rs
//! 3. The incremental styler, which seeds the state for a range from its line-start
//!    checkpoint cache and tells the host how far an edit reaches ./lexing/styler.rs
//!
//! Hosts implement [`StyleHost`]; [`StyledBuffer`] is the in-memory one.

pub mod host;
pub mod scanner;
pub mod state_machine;
pub mod styler;

pub use host::{StyleHost, StyledBuffer};
pub use scanner::{Lexeme, Scanner, ScannerError};
pub use state_machine::{LexState, StateMachine, Transition};
pub use styler::{coalesce, IncrementalStyler, StylePass, StyleSpan};

use crate::ptyx::registry::GrammarRegistry;
use std::sync::Arc;

/// Style `text` from scratch with the stock ptyx grammar.
pub fn style_document(text: &str) -> Result<Vec<StyleSpan>, ScannerError> {
    let mut styler = IncrementalStyler::new(Arc::new(GrammarRegistry::ptyx()))?;
    Ok(styler.style_text(text))
}
