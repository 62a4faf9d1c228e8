//! Mode/style state machine
//!
//! Classifies one lexeme at a time. The only state is a [`LexState`]: the style
//! of the previous lexeme, the active mode, and the mode that was active before
//! the last mode change. The latter is a one-level stack: closing a string goes
//! back to whatever mode opened it (default markup, a script block, or an
//! inline expression). Strings never nest, so one remembered mode is enough.
//!
//! Rules are tried in a fixed order and the first applicable one wins:
//!
//! 1. Inside a language comment, a newline ends the comment.
//! 2. String mode: newline downgrades single-line strings, the opening quote closes.
//! 3. MCQ core mode: include directives, closing `>>>`.
//! 4. Config mode: closing `===`, comments, configuration keys.
//! 5. Block toggles: `....`, `#PYTHON`, `#END_PYTHON`, `#END` in a block, `}` closing an expression.
//! 6. Script block or expression mode: quotes, keywords, builtins, numbers, comments.
//! 7. Default markup: tags, comments, macros, answers, version markers, block openers.

use crate::ptyx::registry::GrammarRegistry;
use crate::ptyx::styling::{Mode, StyleTag};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*(?:\[[^\]]*\])?$").expect("variable pattern is valid"));

/// State threaded from one lexeme to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LexState {
    pub style: StyleTag,
    pub mode: Mode,
    /// Mode active before the most recent mode change.
    pub previous_mode: Mode,
}

impl LexState {
    pub const fn new(style: StyleTag, mode: Mode, previous_mode: Mode) -> Self {
        Self {
            style,
            mode,
            previous_mode,
        }
    }
}

impl Default for LexState {
    fn default() -> Self {
        Self::new(StyleTag::Default, Mode::Default, Mode::Default)
    }
}

/// Outcome of classifying a single lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub style: StyleTag,
    pub mode: Mode,
}

impl Transition {
    const fn new(style: StyleTag, mode: Mode) -> Self {
        Self { style, mode }
    }
}

/// Pure classifier over a shared grammar registry.
#[derive(Debug, Clone)]
pub struct StateMachine {
    registry: Arc<GrammarRegistry>,
}

impl StateMachine {
    pub fn new(registry: Arc<GrammarRegistry>) -> Self {
        Self { registry }
    }

    /// Classify `lexeme` and return the next state.
    ///
    /// `previous_mode` only moves when the mode actually changes; updating it on
    /// every lexeme would lose the mode a string has to return to.
    pub fn step(&self, lexeme: &str, state: LexState) -> LexState {
        let next = self.transition(lexeme, state);
        debug_assert!(
            state.mode.admits(next.style) || next.mode.admits(next.style),
            "{:?} emitted between {} and {} for {:?}",
            next.style,
            state.mode,
            next.mode,
            lexeme
        );

        let previous_mode = if next.mode != state.mode {
            state.mode
        } else {
            state.previous_mode
        };
        LexState::new(next.style, next.mode, previous_mode)
    }

    /// Decide the style and mode of `lexeme` given the current state.
    pub fn transition(&self, lexeme: &str, state: LexState) -> Transition {
        let LexState {
            style,
            mode,
            previous_mode,
        } = state;

        // 1. Language and macro comments run to the end of the line
        if style == StyleTag::LanguageComment {
            return if is_newline(lexeme) {
                Transition::new(StyleTag::Default, Mode::Default)
            } else {
                Transition::new(StyleTag::LanguageComment, Mode::Default)
            };
        }

        match mode {
            Mode::PythonString => return string_transition(lexeme, style, previous_mode),
            Mode::McqCore => return core_transition(lexeme),
            Mode::Config => return self.config_transition(lexeme),
            _ => {}
        }

        // 5. Block and expression toggles
        if is_run_of(lexeme, '.', 4) {
            let next = if mode == Mode::PythonBlock {
                Mode::Default
            } else {
                Mode::PythonBlock
            };
            return Transition::new(StyleTag::BlockDelimiter, next);
        }
        match lexeme {
            "#PYTHON" => return Transition::new(StyleTag::BlockDelimiter, Mode::PythonBlock),
            "#END_PYTHON" | "#END" if mode == Mode::PythonBlock => {
                return Transition::new(StyleTag::BlockDelimiter, Mode::Default)
            }
            "}" if mode == Mode::Expression => {
                return Transition::new(StyleTag::Tag, Mode::Default)
            }
            _ => {}
        }

        if matches!(mode, Mode::PythonBlock | Mode::Expression) {
            return self.script_transition(lexeme, mode);
        }

        self.markup_transition(lexeme, mode)
    }

    /// 4. Header block
    fn config_transition(&self, lexeme: &str) -> Transition {
        if is_run_of(lexeme, '=', 3) {
            return Transition::new(StyleTag::HeaderDelimiter, Mode::Default);
        }
        if lexeme.trim_start().starts_with('#') {
            return Transition::new(StyleTag::HeaderComment, Mode::Config);
        }
        if let Some(key) = lexeme.strip_suffix('=') {
            if self.registry.is_config_key(key.trim()) {
                return Transition::new(StyleTag::ConfigKey, Mode::Config);
            }
        }
        Transition::new(StyleTag::HeaderBody, Mode::Config)
    }

    /// 6. Script block or inline expression
    fn script_transition(&self, lexeme: &str, mode: Mode) -> Transition {
        if let Some(string_style) = StyleTag::for_quote(lexeme) {
            return Transition::new(string_style, Mode::PythonString);
        }
        if self.registry.is_keyword(lexeme) {
            return Transition::new(StyleTag::Keyword, mode);
        }
        if self.registry.is_builtin(lexeme) {
            return Transition::new(StyleTag::Builtin, mode);
        }
        if is_numeric(lexeme) {
            return Transition::new(StyleTag::Integer, mode);
        }
        if lexeme.trim_start().starts_with('#') {
            return Transition::new(StyleTag::PythonComment, mode);
        }
        Transition::new(StyleTag::PythonBody, mode)
    }

    /// 7. Template markup
    fn markup_transition(&self, lexeme: &str, mode: Mode) -> Transition {
        if let Some(suffix) = lexeme.strip_prefix('#') {
            return self.hash_transition(suffix, mode);
        }

        if lexeme.starts_with(is_blank) && lexeme.trim_start().starts_with('#') {
            return Transition::new(StyleTag::Comment, mode);
        }
        if is_macro(lexeme) {
            return Transition::new(StyleTag::Macro, mode);
        }

        match lexeme {
            "+ " => return Transition::new(StyleTag::CorrectAnswer, mode),
            "- " => return Transition::new(StyleTag::IncorrectAnswer, mode),
            "! " => return Transition::new(StyleTag::NeutralizedAnswer, mode),
            "?{" => return Transition::new(StyleTag::ConditionalAnswer, Mode::Expression),
            "%" => return Transition::new(StyleTag::LanguageComment, mode),
            _ => {}
        }
        if is_version_marker(lexeme) {
            return Transition::new(StyleTag::AlternativeVersion, mode);
        }

        if mode == Mode::Default {
            if is_run_of(lexeme, '=', 3) {
                return Transition::new(StyleTag::HeaderDelimiter, Mode::Config);
            }
            if is_run_of(lexeme, '<', 3) {
                return Transition::new(StyleTag::CoreDelimiter, Mode::McqCore);
            }
        }

        Transition::new(StyleTag::Default, mode)
    }

    /// Lexemes starting with `#`, classified by what follows the hash.
    fn hash_transition(&self, suffix: &str, mode: Mode) -> Transition {
        if suffix.starts_with(is_blank) {
            return Transition::new(StyleTag::LanguageComment, mode);
        }
        if suffix == "{" {
            return Transition::new(StyleTag::InlineExpression, Mode::Expression);
        }
        if let Some(name) = suffix.strip_suffix('{') {
            if self.registry.is_argument_tag(name) {
                return Transition::new(StyleTag::Tag, Mode::Expression);
            }
        }

        let name = suffix.split('[').next().unwrap_or(suffix);
        if self.registry.is_plain_tag(name) || self.registry.is_argument_tag(name) {
            return Transition::new(StyleTag::Tag, mode);
        }
        if VARIABLE_NAME.is_match(suffix) {
            return Transition::new(StyleTag::Variable, mode);
        }
        Transition::new(StyleTag::Default, mode)
    }
}

/// 2. String mode
fn string_transition(lexeme: &str, style: StyleTag, previous_mode: Mode) -> Transition {
    if is_newline(lexeme) && style.is_single_line_string() {
        return Transition::new(StyleTag::UnclosedString, previous_mode);
    }
    if style.closing_quote() == Some(lexeme) {
        return Transition::new(style, previous_mode);
    }
    Transition::new(style, Mode::PythonString)
}

/// 3. MCQ core block
fn core_transition(lexeme: &str) -> Transition {
    if lexeme.starts_with("!--") {
        return Transition::new(StyleTag::DisabledInclude, Mode::McqCore);
    }
    if lexeme.starts_with("--") && lexeme.ends_with(':') {
        return Transition::new(StyleTag::ChangeDirectory, Mode::McqCore);
    }
    if lexeme.starts_with("--") && lexeme.len() > 2 && lexeme[2..].trim().is_empty() {
        return Transition::new(StyleTag::Include, Mode::McqCore);
    }
    if is_run_of(lexeme, '>', 3) {
        return Transition::new(StyleTag::CoreDelimiter, Mode::Default);
    }
    Transition::new(StyleTag::CoreBody, Mode::McqCore)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub(crate) fn is_newline(lexeme: &str) -> bool {
    lexeme == "\n" || lexeme == "\r\n"
}

/// `lexeme` is at least `min` repetitions of `c` and nothing else.
fn is_run_of(lexeme: &str, c: char, min: usize) -> bool {
    lexeme.len() >= min && lexeme.chars().all(|ch| ch == c)
}

fn is_numeric(lexeme: &str) -> bool {
    let digits = lexeme.replace('.', "");
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_macro(lexeme: &str) -> bool {
    match lexeme.strip_prefix('\\') {
        Some(rest) if !rest.is_empty() => {
            rest.chars().all(|c| c.is_ascii_alphabetic()) || matches!(rest, "%" | "{" | "}")
        }
        _ => false,
    }
}

fn is_version_marker(lexeme: &str) -> bool {
    lexeme.starts_with("OR") && lexeme.ends_with('\n') && lexeme[2..].trim().is_empty()
}
