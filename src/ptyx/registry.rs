//! Grammar registry
//!
//! The names the lexer recognizes are not hardcoded in the scanner or the state
//! machine. They come from a [`GrammarRegistry`] built once at startup (from the
//! ptyx defaults, optionally extended by configuration) and shared by reference.
//! Tests build synthetic registries with the `with_*` builders.

use std::collections::{BTreeSet, HashSet};

/// Reserved words of the embedded script language.
pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Words that only act as keywords inside ptyx script blocks.
pub const SOFT_KEYWORDS: &[&str] = &["let", "match", "case"];

/// Builtins of the embedded script language.
pub const PYTHON_BUILTINS: &[&str] = &[
    "abs", "all", "any", "ascii", "bin", "bool", "breakpoint", "bytearray", "bytes",
    "callable", "chr", "classmethod", "compile", "complex", "delattr", "dict", "dir",
    "divmod", "enumerate", "eval", "exec", "filter", "float", "format", "frozenset",
    "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "int",
    "isinstance", "issubclass", "iter", "len", "list", "locals", "map", "max", "memoryview",
    "min", "next", "object", "oct", "open", "ord", "pow", "print", "property", "range",
    "repr", "reversed", "round", "set", "setattr", "slice", "sorted", "staticmethod", "str",
    "sum", "super", "tuple", "type", "vars", "zip", "Exception", "ValueError", "TypeError",
    "ZeroDivisionError",
];

/// Names the ptyx template engine injects into every script context.
pub const TEMPLATE_BUILTINS: &[&str] = &[
    "randint", "srandint", "randsignint", "randfrac", "srandfrac", "randchoice",
    "srandchoice", "randpoint", "randmain", "many", "distinct", "shuffle", "sign", "round",
    "latex", "sympy", "sympy_latex", "write", "print", "S", "PTYX_NUM", "PTYX_WITH_ANSWERS",
    "PTYX_VERSION", "PTYX_SEED", "ANSWER", "APPLY_TO_ANSWERS",
];

/// Tags written `#NAME{...}`, whose argument is a script expression.
pub const ARGUMENT_TAGS: &[&str] = &[
    "ASSERT", "CALL", "CASE", "COMMENT_IF", "DEBUG", "ELIF", "EVAL", "GEN", "IF", "IMPORT",
    "LOAD", "MACRO", "NUM", "PICK_IF", "SEED", "SHUFFLE_IF", "SIGN", "TEST", "VERSION",
];

/// Tags taking no argument. Punctuation tags (`#+`, `##`, ...) are listed by their suffix.
pub const PLAIN_TAGS: &[&str] = &[
    "ANS", "ANSWER", "ANSWERS_BLOCK", "COMMENT", "CONDITIONAL_ANSWER", "ELSE", "END",
    "END_ANSWERS_BLOCK", "END_COMMENT", "END_IF", "END_PICK", "END_PYTHON", "END_QUESTIONS",
    "END_SHUFFLE", "END_TEST", "GCALC", "ITEM", "L_ANSWERS", "NEW_QUESTION", "PICK", "PYTHON",
    "QUESTION", "QUESTIONS", "RAND", "ROUND", "SHUFFLE", "SP", "+", "-", "*", "=", "?", "#",
];

/// Keys recognized on `key = value` lines of a `===` header.
pub const CONFIG_KEYS: &[&str] = &[
    "ceil", "correct", "default_score", "floor", "id", "ids", "incorrect", "lang", "max_score",
    "mode", "names", "packages", "questions", "seed", "shuffle", "skipped", "students", "sty",
    "subject", "title", "version", "versions",
];

/// Explicit grammar configuration shared by the scanner and the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRegistry {
    argument_tags: BTreeSet<String>,
    plain_tags: BTreeSet<String>,
    builtins: HashSet<String>,
    config_keys: BTreeSet<String>,
}

impl GrammarRegistry {
    /// A registry with no tags, builtins or configuration keys.
    pub fn empty() -> Self {
        Self {
            argument_tags: BTreeSet::new(),
            plain_tags: BTreeSet::new(),
            builtins: HashSet::new(),
            config_keys: BTreeSet::new(),
        }
    }

    /// The registry of the stock ptyx toolchain.
    pub fn ptyx() -> Self {
        Self::empty()
            .with_argument_tags(ARGUMENT_TAGS.iter().copied())
            .with_plain_tags(PLAIN_TAGS.iter().copied())
            .with_builtins(PYTHON_BUILTINS.iter().copied())
            .with_builtins(TEMPLATE_BUILTINS.iter().copied())
            .with_config_keys(CONFIG_KEYS.iter().copied())
    }

    pub fn with_argument_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argument_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_plain_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plain_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_builtins<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtins.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_config_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn is_argument_tag(&self, name: &str) -> bool {
        self.argument_tags.contains(name)
    }

    pub fn is_plain_tag(&self, name: &str) -> bool {
        self.plain_tags.contains(name)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        PYTHON_KEYWORDS.contains(&word) || SOFT_KEYWORDS.contains(&word)
    }

    pub fn is_builtin(&self, word: &str) -> bool {
        self.builtins.contains(word)
    }

    pub fn is_config_key(&self, key: &str) -> bool {
        self.config_keys.contains(key)
    }

    pub fn argument_tags(&self) -> impl Iterator<Item = &str> {
        self.argument_tags.iter().map(String::as_str)
    }

    pub fn config_keys(&self) -> impl Iterator<Item = &str> {
        self.config_keys.iter().map(String::as_str)
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::ptyx()
    }
}

impl From<&ptyx_config::GrammarConfig> for GrammarRegistry {
    /// The stock registry extended with the configured extras.
    fn from(config: &ptyx_config::GrammarConfig) -> Self {
        Self::ptyx()
            .with_argument_tags(config.argument_tags.iter().cloned())
            .with_plain_tags(config.plain_tags.iter().cloned())
            .with_builtins(config.builtins.iter().cloned())
            .with_config_keys(config.config_keys.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_registry_contents() {
        let registry = GrammarRegistry::ptyx();
        assert!(registry.is_argument_tag("IF"));
        assert!(!registry.is_argument_tag("ELSE"));
        assert!(registry.is_plain_tag("END_PYTHON"));
        assert!(registry.is_plain_tag("+"));
        assert!(registry.is_builtin("randint"));
        assert!(registry.is_builtin("len"));
        assert!(registry.is_config_key("correct"));
    }

    #[test]
    fn keywords_are_fixed() {
        let registry = GrammarRegistry::empty();
        assert!(registry.is_keyword("lambda"));
        assert!(registry.is_keyword("let"));
        assert!(!registry.is_keyword("randint"));
    }

    #[test]
    fn config_extends_stock_registry() {
        let config = ptyx_config::GrammarConfig {
            argument_tags: vec!["PLOT".to_string()],
            builtins: vec!["numpy".to_string()],
            ..Default::default()
        };
        let registry = GrammarRegistry::from(&config);
        assert!(registry.is_argument_tag("PLOT"));
        assert!(registry.is_argument_tag("IF"));
        assert!(registry.is_builtin("numpy"));
    }
}
