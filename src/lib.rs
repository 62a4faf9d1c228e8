//! # ptyx-lexer
//!
//! Incremental lexer and block tooling for ptyx templates: LaTeX-like markup with
//! `#TAG` directives, `....`-delimited Python blocks, `===` configuration headers
//! and `<<<`/`>>>` MCQ core blocks.
//!
//! - [`ptyx::lexing`] styles documents incrementally for editor hosts.
//! - [`ptyx::blocks`] extracts the embedded Python blocks and runs an external
//!   checker and formatter over them, mapping results back onto the document.

pub mod ptyx;

pub use ptyx::lexing::{style_document, IncrementalStyler, StyleHost, StyledBuffer};
pub use ptyx::registry::GrammarRegistry;
pub use ptyx::styling::{Mode, StyleTag};
