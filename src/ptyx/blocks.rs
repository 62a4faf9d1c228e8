//! Embedded script blocks
//!
//! Tooling for the Python code between `....` delimiters:
//!
//! - ./blocks/extractor.rs finds the blocks and rebuilds documents around them
//! - ./blocks/directive.rs parses `let` directives and rewrites them for checkers
//! - ./blocks/sentinel.rs hides directives from formatters and puts them back
//! - ./blocks/tool.rs runs external checkers and formatters
//! - ./blocks/adapter.rs ties these together per block

pub mod adapter;
pub mod directive;
pub mod extractor;
pub mod sentinel;
pub mod tool;

pub use adapter::{BlockChecker, BlockFormatter, DEFAULT_SENTINEL};
pub use directive::{parse_directive, DirectiveError, LetDirective};
pub use extractor::{extract_blocks, is_block_delimiter, rewrite_blocks, CodeBlock};
pub use sentinel::{normalize_directive, DirectiveQueue};
pub use tool::{ExternalTool, ProcessTool, ToolError, ToolOutput};
