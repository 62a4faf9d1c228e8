//! Token scanner
//!
//! Splits text into lexemes with a single alternation regex compiled once from a
//! [`GrammarRegistry`]. Alternatives are tried in a fixed priority order at each
//! position (leftmost-first), and the last one matches any single character, so
//! every input is covered: concatenating the lexemes gives back the input.
//!
//! The scanner works on byte offsets into the full text rather than on a copied
//! slice, so start-of-line anchors see the real line boundaries when a range
//! starts in the middle of a document.

use crate::ptyx::registry::GrammarRegistry;
use regex::Regex;
use std::fmt;
use std::ops::Range;
use tracing::debug;

/// Errors raised while compiling the token grammar
#[derive(Debug, Clone, PartialEq)]
pub enum ScannerError {
    /// The alternation built from the registry is not a valid regex
    InvalidGrammar(String),
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerError::InvalidGrammar(msg) => write!(f, "Invalid token grammar: {}", msg),
        }
    }
}

impl std::error::Error for ScannerError {}

/// One matched lexeme and its byte offset in the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'t> {
    pub text: &'t str,
    pub start: usize,
}

impl<'t> Lexeme<'t> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// UTF-8 length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Compiled master token grammar.
#[derive(Debug, Clone)]
pub struct Scanner {
    regex: Regex,
}

impl Scanner {
    /// Compile the token grammar for `registry`.
    pub fn new(registry: &GrammarRegistry) -> Result<Self, ScannerError> {
        let alternatives = grammar_alternatives(registry);
        let pattern = format!("(?m){}", alternatives.join("|"));
        debug!(
            alternatives = alternatives.len(),
            pattern_len = pattern.len(),
            "compiling token grammar"
        );
        let regex =
            Regex::new(&pattern).map_err(|e| ScannerError::InvalidGrammar(e.to_string()))?;
        Ok(Self { regex })
    }

    /// Split `text` into lexemes.
    pub fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.lexemes(text, 0..text.len()).map(|l| l.text).collect()
    }

    /// Iterate the lexemes of `text[range]`.
    ///
    /// Matching stops at `range.end`, so the last lexeme may be cut short there.
    /// Both ends of `range` must lie on char boundaries.
    pub fn lexemes<'s, 't>(&'s self, text: &'t str, range: Range<usize>) -> Lexemes<'s, 't> {
        let end = range.end.min(text.len());
        Lexemes {
            regex: &self.regex,
            haystack: &text[..end],
            pos: range.start.min(end),
        }
    }
}

/// Iterator over the lexemes of a range, see [`Scanner::lexemes`].
#[derive(Debug)]
pub struct Lexemes<'s, 't> {
    regex: &'s Regex,
    haystack: &'t str,
    pos: usize,
}

impl<'s, 't> Iterator for Lexemes<'s, 't> {
    type Item = Lexeme<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.haystack.len() {
            return None;
        }

        let start = self.pos;
        let end = match self.regex.find_at(self.haystack, start) {
            Some(m) if m.start() == start && m.end() > start => m.end(),
            // Unreachable with the fallback alternative, kept so iteration always advances
            _ => {
                start
                    + self.haystack[start..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8)
            }
        };

        self.pos = end;
        Some(Lexeme {
            text: &self.haystack[start..end],
            start,
        })
    }
}

/// The priority-ordered alternatives of the token grammar.
fn grammar_alternatives(registry: &GrammarRegistry) -> Vec<String> {
    let mut alternatives: Vec<String> = Vec::new();

    // Script block delimiter
    alternatives.push(r"^\.{4,}".to_string());

    // Tags taking a script argument, glued to their opening brace
    let mut argument_tags: Vec<&str> = registry.argument_tags().collect();
    if !argument_tags.is_empty() {
        argument_tags.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let names: Vec<String> = argument_tags.iter().map(|t| regex::escape(t)).collect();
        alternatives.push(format!(r"#(?:{})\{{", names.join("|")));
    }

    // Generic tag or variable reference, optionally bracket-annotated
    alternatives.push(r"#\w+(?:\[[^\]\r\n]*\])?".to_string());

    // Core block directives: disabled include, change directory, include
    alternatives.push(r"^!--[ \t]".to_string());
    alternatives.push(r"^--[ \t]+(?:DIR|ROOT):".to_string());
    alternatives.push(r"^--[ \t]".to_string());

    // Header and core block delimiters
    alternatives.push(r"^={3,}".to_string());
    alternatives.push(r"^<{3,}".to_string());
    alternatives.push(r"^>{3,}".to_string());

    // Header configuration keys
    let mut keys: Vec<&str> = registry.config_keys().collect();
    if !keys.is_empty() {
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let keys: Vec<String> = keys.iter().map(|k| regex::escape(k)).collect();
        alternatives.push(format!(r"^[ \t]*(?:{})[ \t]*=", keys.join("|")));
    }

    // Whole-line and end-of-line comments
    alternatives.push(r"^[ \t]*#[ \t][^\r\n]*".to_string());
    alternatives.push(r"[ \t]+#[ \t][^\r\n]*".to_string());

    // Punctuation tags
    alternatives.push(r"#\+|#-|#\*|#=|#\?|##|#\{".to_string());

    // Answer markers and conditional answer opener
    alternatives.push(r"^[+\-!] ".to_string());
    alternatives.push(r"\?\{".to_string());

    // Alternative version marker, newline included
    alternatives.push(r"^OR[ \t]*(?:\r?\n|$)".to_string());

    // Escaped backslash and quotes, before any quote can be seen alone
    alternatives.push(r#"\\\\|\\'|\\""#.to_string());

    // Macros and escaped special characters
    alternatives.push(r"\\[a-zA-Z]+|\\[%{}]".to_string());

    alternatives.push(r#"'''|""""#.to_string());
    alternatives.push(r"\r?\n".to_string());
    alternatives.push(r"[ \t]+".to_string());
    // Numbers come before words so that `3.14` stays one lexeme
    alternatives.push(r"[0-9]+\.[0-9]+|[0-9]+|\.[0-9]+".to_string());
    alternatives.push(r"\w+".to_string());
    alternatives.push(r"(?s:.)".to_string());

    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> Scanner {
        Scanner::new(&GrammarRegistry::ptyx()).expect("stock grammar compiles")
    }

    #[test]
    fn test_empty_input() {
        assert!(scanner().tokenize("").is_empty());
    }

    #[test]
    fn test_words_and_whitespace() {
        assert_eq!(scanner().tokenize("hello  world"), vec!["hello", "  ", "world"]);
    }

    #[test]
    fn test_block_delimiter_only_at_line_start() {
        assert_eq!(scanner().tokenize("....\n"), vec!["....", "\n"]);
        assert_eq!(scanner().tokenize("a ...."), vec!["a", " ", ".", ".", ".", "."]);
    }

    #[test]
    fn test_argument_tag_glues_brace() {
        assert_eq!(scanner().tokenize("#IF{a>2}"), vec!["#IF{", "a", ">", "2", "}"]);
        assert_eq!(scanner().tokenize("#ELSE{"), vec!["#ELSE", "{"]);
    }

    #[test]
    fn test_tag_with_annotation() {
        assert_eq!(scanner().tokenize("#a[0] #b"), vec!["#a[0]", " ", "#b"]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(scanner().tokenize("# note\n"), vec!["# note", "\n"]);
        assert_eq!(scanner().tokenize("x = 1  # one"), vec!["x", " ", "=", " ", "1", "  # one"]);
    }

    #[test]
    fn test_answer_markers() {
        assert_eq!(scanner().tokenize("+ yes\n"), vec!["+ ", "yes", "\n"]);
        assert_eq!(scanner().tokenize("a + b"), vec!["a", " ", "+", " ", "b"]);
        assert_eq!(scanner().tokenize("?{x}"), vec!["?{", "x", "}"]);
    }

    #[test]
    fn test_alternative_version_marker() {
        assert_eq!(scanner().tokenize("OR\nx"), vec!["OR\n", "x"]);
        assert_eq!(scanner().tokenize("OR else"), vec!["OR", " ", "else"]);
    }

    #[test]
    fn test_core_directives() {
        assert_eq!(
            scanner().tokenize("-- DIR: q\n-- a.ex\n!-- b.ex"),
            vec!["-- DIR:", " ", "q", "\n", "-- ", "a", ".", "ex", "\n", "!-- ", "b", ".", "ex"]
        );
    }

    #[test]
    fn test_escapes_and_macros() {
        assert_eq!(scanner().tokenize(r"\'a\\"), vec![r"\'", "a", r"\\"]);
        assert_eq!(scanner().tokenize(r"\frac\%"), vec![r"\frac", r"\%"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(scanner().tokenize("3.14 .5 42"), vec!["3.14", " ", ".5", " ", "42"]);
    }

    #[test]
    fn test_unicode_fallback() {
        let tokens = scanner().tokenize("é→");
        assert_eq!(tokens, vec!["é", "→"]);
    }

    #[test]
    fn test_range_respects_line_context() {
        let text = "ab\n....\n";
        let scanner = scanner();
        let lexemes: Vec<_> = scanner.lexemes(text, 3..7).collect();
        assert_eq!(lexemes, vec![Lexeme { text: "....", start: 3 }]);

        // Mid-line, the same dots are not a delimiter
        let lexemes: Vec<_> = scanner.lexemes(text, 4..7).map(|l| l.text).collect();
        assert_eq!(lexemes, vec![".", ".", "."]);
    }

    #[test]
    fn test_range_cuts_last_lexeme() {
        let lexemes: Vec<_> = scanner().lexemes("hello", 1..3).map(|l| l.text).collect();
        assert_eq!(lexemes, vec!["el"]);
    }

    #[test]
    fn test_empty_registry_compiles() {
        let scanner = Scanner::new(&GrammarRegistry::empty()).unwrap();
        assert_eq!(scanner.tokenize("#IF{"), vec!["#IF", "{"]);
    }
}
