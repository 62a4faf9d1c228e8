//! Main module for ptyx lexer functionality

pub mod blocks;
pub mod diagnostics;
pub mod lexing;
pub mod registry;
pub mod styling;
