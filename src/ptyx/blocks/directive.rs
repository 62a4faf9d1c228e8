//! `let` directives
//!
//! Script blocks may bind random integers with a line such as
//!
//! ```text
//! let a, b in -5..5
//! let x in +-1..9, 10..20
//! ```
//!
//! Grammar: `let NAME ("," NAME)* in RANGE ("," RANGE)*` where
//! `RANGE = "+-"? INT ".." INT`, `INT = ("+" | "-")? DIGITS`, and `+-` asks for a
//! random sign (never zero). Checkers don't know this statement, so before a
//! block is checked every directive line is rewritten to an equivalent
//! assignment, or to `pass` when it is malformed.
//!
//! The line is tokenized with logos and parsed with chumsky.

use chumsky::error::SimpleReason;
use chumsky::{prelude::*, select, Stream};
use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

/// A line that starts, after indentation, with the `let` keyword.
static DIRECTIVE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*let[ \t]").expect("directive pattern is valid"));

#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t]+")]
pub enum DirectiveToken {
    #[token("let")]
    Let,
    #[token("in")]
    In,
    #[token(",")]
    Comma,
    #[token("..")]
    DotDot,
    #[token("+-")]
    RandomSign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),
}

impl fmt::Display for DirectiveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveToken::Let => write!(f, "`let`"),
            DirectiveToken::In => write!(f, "`in`"),
            DirectiveToken::Comma => write!(f, "`,`"),
            DirectiveToken::DotDot => write!(f, "`..`"),
            DirectiveToken::RandomSign => write!(f, "`+-`"),
            DirectiveToken::Plus => write!(f, "`+`"),
            DirectiveToken::Minus => write!(f, "`-`"),
            DirectiveToken::Int(n) => write!(f, "integer {}", n),
            DirectiveToken::Name(name) => write!(f, "name `{}`", name),
        }
    }
}

/// Inclusive integer range a variable is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub start: i64,
    pub end: i64,
    /// `+-` prefix: draw from the range, then negate at random.
    pub random_sign: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetDirective {
    pub names: Vec<String>,
    pub ranges: Vec<IntRange>,
}

impl LetDirective {
    /// An assignment binding the same names, for tools that don't know `let`.
    pub fn to_assignment(&self) -> String {
        let values = vec!["0"; self.names.len()];
        format!("{} = {}", self.names.join(", "), values.join(", "))
    }
}

/// A malformed directive. Columns are character offsets on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveError {
    pub message: String,
    pub columns: Range<usize>,
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid let directive at column {}: {}",
            self.columns.start + 1,
            self.message
        )
    }
}

impl std::error::Error for DirectiveError {}

/// Does `line` hold a `let` directive?
pub fn is_directive_line(line: &str) -> bool {
    DIRECTIVE_LINE.is_match(line)
}

/// Leading whitespace of `line`.
pub fn indentation(line: &str) -> &str {
    let content = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - content.len()]
}

/// Parse a full directive line, indentation included.
pub fn parse_directive(line: &str) -> Result<LetDirective, DirectiveError> {
    let indent = indentation(line);
    let body = line[indent.len()..].trim_end();
    let columns = |span: Range<usize>| {
        let start = line[..indent.len() + span.start].chars().count();
        let len = body
            .get(span.clone())
            .map_or(1, |s| s.chars().count().max(1));
        start..start + len
    };

    let tokens = lex_directive(body).map_err(|span| DirectiveError {
        message: format!("unexpected character `{}`", &body[span.clone()]),
        columns: columns(span),
    })?;

    let eoi = body.len()..body.len() + 1;
    directive_parser()
        .parse(Stream::from_iter(eoi, tokens.into_iter()))
        .map_err(|errors| match errors.first() {
            // Report the first error only, the rest are usually knock-on effects
            Some(error) => DirectiveError {
                message: describe(error),
                columns: columns(error.span()),
            },
            None => DirectiveError {
                message: "malformed directive".to_string(),
                columns: columns(0..body.len()),
            },
        })
}

/// Rewrite a block line for the checker: directives become assignments, malformed
/// directives become `pass` and an error. Other lines pass through.
pub fn rewrite_for_checker(line: &str) -> (Cow<'_, str>, Option<DirectiveError>) {
    if !is_directive_line(line) {
        return (Cow::Borrowed(line), None);
    }
    let indent = indentation(line);
    match parse_directive(line) {
        Ok(directive) => (
            Cow::Owned(format!("{}{}", indent, directive.to_assignment())),
            None,
        ),
        Err(error) => (Cow::Owned(format!("{}pass", indent)), Some(error)),
    }
}

/// Tokens with byte spans, or the span of the first unlexable character.
fn lex_directive(body: &str) -> Result<Vec<(DirectiveToken, Range<usize>)>, Range<usize>> {
    let mut lexer = DirectiveToken::lexer(body);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(lexer.span()),
        }
    }

    Ok(tokens)
}

type ParserError = Simple<DirectiveToken>;

fn directive_parser() -> impl Parser<DirectiveToken, LetDirective, Error = ParserError> {
    let name = select! { DirectiveToken::Name(name) => name };
    let int = select! { DirectiveToken::Int(n) => n };

    let sign = just(DirectiveToken::Minus)
        .to(-1)
        .or(just(DirectiveToken::Plus).to(1))
        .or_not()
        .map(|sign| sign.unwrap_or(1));
    let bound = sign.then(int).map(|(sign, n)| sign * n);

    let range = just(DirectiveToken::RandomSign)
        .or_not()
        .then(bound.clone())
        .then_ignore(just(DirectiveToken::DotDot))
        .then(bound)
        .try_map(|((random_sign, start), stop), span| {
            if start > stop {
                Err(Simple::custom(
                    span,
                    format!("empty range {}..{}", start, stop),
                ))
            } else {
                Ok(IntRange {
                    start,
                    end: stop,
                    random_sign: random_sign.is_some(),
                })
            }
        });

    just(DirectiveToken::Let)
        .ignore_then(
            name.separated_by(just(DirectiveToken::Comma))
                .at_least(1),
        )
        .then_ignore(just(DirectiveToken::In))
        .then(range.separated_by(just(DirectiveToken::Comma)).at_least(1))
        .then_ignore(end())
        .map(|(names, ranges)| LetDirective { names, ranges })
}

fn describe(error: &ParserError) -> String {
    if let SimpleReason::Custom(message) = error.reason() {
        return message.clone();
    }
    match error.found() {
        Some(token) => format!("unexpected {}", token),
        None => "unexpected end of directive".to_string(),
    }
}
