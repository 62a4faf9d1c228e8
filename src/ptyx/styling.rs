//! Style tags, modes and the static style table
//!
//! Every token the lexer classifies is tagged with a [`StyleTag`]. Each tag owns
//! exactly one immutable [`StyleRecord`] describing the [`Mode`] it implies and
//! how a host editor may paint it. Records live in a fixed array indexed by the
//! tag discriminant, so the table cannot miss a member.
//!
//! The lexer never decides how spans are displayed; colors here are defaults a
//! host may ignore.

use serde::Serialize;
use std::fmt;

/// Coarse-grained parsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Template markup (tags, macros, MCQ answers)
    Default,
    /// Inside a `....` or `#PYTHON` script block
    PythonBlock,
    /// Inside a script-language string literal
    PythonString,
    /// Inside an inline expression such as `#{...}` or `#IF{...}`
    Expression,
    /// Inside a `===` header block
    Config,
    /// Inside a `<<<` / `>>>` MCQ core block
    McqCore,
}

impl Mode {
    /// Whether a token tagged `tag` may be emitted while this mode is active.
    ///
    /// A tag is admitted by its own mode. Inline expressions reuse the
    /// script-language tags of script blocks.
    pub fn admits(self, tag: StyleTag) -> bool {
        let implied = tag.mode();
        implied == self || (self == Mode::Expression && implied == Mode::PythonBlock)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Default => "default",
            Mode::PythonBlock => "python-block",
            Mode::PythonString => "python-string",
            Mode::Expression => "expression",
            Mode::Config => "config",
            Mode::McqCore => "mcq-core",
        };
        f.write_str(name)
    }
}

/// Packed `0xRRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color(pub u32);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Immutable styling metadata attached to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRecord {
    pub mode: Mode,
    pub foreground: Color,
    pub background: Color,
    pub bold: bool,
    pub italic: bool,
    /// Paint the background up to the end of the line, past trailing whitespace.
    pub eol_fill: bool,
}

const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
const PYTHON_BG: Color = Color::rgb(0xf5, 0xf2, 0xe8);
const HEADER_BG: Color = Color::rgb(0xe8, 0xf0, 0xfa);
const CORE_BG: Color = Color::rgb(0xee, 0xf7, 0xee);

const fn record(mode: Mode, foreground: Color, background: Color) -> StyleRecord {
    StyleRecord {
        mode,
        foreground,
        background,
        bold: false,
        italic: false,
        eol_fill: false,
    }
}

const fn bold(mut record: StyleRecord) -> StyleRecord {
    record.bold = true;
    record
}

const fn italic(mut record: StyleRecord) -> StyleRecord {
    record.italic = true;
    record
}

const fn filled(mut record: StyleRecord) -> StyleRecord {
    record.eol_fill = true;
    record
}

/// Highlighting category of a token.
///
/// The discriminant indexes [`STYLE_TABLE`]; keep both in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StyleTag {
    Default = 0,

    // Template language
    Tag,
    Variable,
    InlineExpression,
    Comment,
    Macro,
    LanguageComment,

    // Script language
    PythonBody,
    BlockDelimiter,
    Integer,
    SingleQuoteString,
    DoubleQuoteString,
    TripleSingleQuoteString,
    TripleDoubleQuoteString,
    UnclosedString,
    Keyword,
    Builtin,
    PythonComment,

    // MCQ markup
    CorrectAnswer,
    IncorrectAnswer,
    NeutralizedAnswer,
    ConditionalAnswer,
    AlternativeVersion,

    // Header block
    HeaderBody,
    HeaderDelimiter,
    ConfigKey,
    HeaderComment,

    // MCQ core block
    CoreBody,
    CoreDelimiter,
    Include,
    ChangeDirectory,
    DisabledInclude,
}

static STYLE_TABLE: [StyleRecord; StyleTag::COUNT] = [
    // Default
    record(Mode::Default, BLACK, WHITE),
    // Tag
    bold(record(Mode::Default, Color::rgb(0x00, 0x5f, 0xaf), WHITE)),
    // Variable
    record(Mode::Default, Color::rgb(0x87, 0x00, 0xaf), WHITE),
    // InlineExpression
    bold(record(Mode::Expression, Color::rgb(0x87, 0x00, 0xaf), WHITE)),
    // Comment
    italic(record(Mode::Default, Color::rgb(0x80, 0x80, 0x80), WHITE)),
    // Macro
    record(Mode::Default, Color::rgb(0x00, 0x87, 0x87), WHITE),
    // LanguageComment
    italic(record(Mode::Default, Color::rgb(0x5f, 0x87, 0x5f), WHITE)),
    // PythonBody
    filled(record(Mode::PythonBlock, BLACK, PYTHON_BG)),
    // BlockDelimiter
    filled(bold(record(Mode::PythonBlock, Color::rgb(0xaf, 0x5f, 0x00), PYTHON_BG))),
    // Integer
    record(Mode::PythonBlock, Color::rgb(0x00, 0x87, 0x00), PYTHON_BG),
    // SingleQuoteString
    record(Mode::PythonString, Color::rgb(0xaf, 0x00, 0x00), PYTHON_BG),
    // DoubleQuoteString
    record(Mode::PythonString, Color::rgb(0xaf, 0x00, 0x00), PYTHON_BG),
    // TripleSingleQuoteString
    filled(record(Mode::PythonString, Color::rgb(0x87, 0x00, 0x00), PYTHON_BG)),
    // TripleDoubleQuoteString
    filled(record(Mode::PythonString, Color::rgb(0x87, 0x00, 0x00), PYTHON_BG)),
    // UnclosedString
    filled(record(Mode::PythonString, BLACK, Color::rgb(0xff, 0xaf, 0xaf))),
    // Keyword
    bold(record(Mode::PythonBlock, Color::rgb(0x00, 0x00, 0xaf), PYTHON_BG)),
    // Builtin
    record(Mode::PythonBlock, Color::rgb(0x5f, 0x00, 0xaf), PYTHON_BG),
    // PythonComment
    italic(record(Mode::PythonBlock, Color::rgb(0x80, 0x80, 0x80), PYTHON_BG)),
    // CorrectAnswer
    bold(record(Mode::Default, Color::rgb(0x00, 0x87, 0x00), WHITE)),
    // IncorrectAnswer
    bold(record(Mode::Default, Color::rgb(0xd7, 0x00, 0x00), WHITE)),
    // NeutralizedAnswer
    bold(record(Mode::Default, Color::rgb(0xaf, 0x87, 0x00), WHITE)),
    // ConditionalAnswer
    bold(record(Mode::Default, Color::rgb(0x00, 0x5f, 0x87), WHITE)),
    // AlternativeVersion
    filled(bold(record(Mode::Default, WHITE, Color::rgb(0x5f, 0x5f, 0x87)))),
    // HeaderBody
    filled(record(Mode::Config, BLACK, HEADER_BG)),
    // HeaderDelimiter
    filled(bold(record(Mode::Config, Color::rgb(0x00, 0x5f, 0xaf), HEADER_BG))),
    // ConfigKey
    bold(record(Mode::Config, Color::rgb(0x00, 0x5f, 0x5f), HEADER_BG)),
    // HeaderComment
    filled(italic(record(Mode::Config, Color::rgb(0x80, 0x80, 0x80), HEADER_BG))),
    // CoreBody
    filled(record(Mode::McqCore, BLACK, CORE_BG)),
    // CoreDelimiter
    filled(bold(record(Mode::McqCore, Color::rgb(0x00, 0x5f, 0x00), CORE_BG))),
    // Include
    bold(record(Mode::McqCore, Color::rgb(0x00, 0x5f, 0xaf), CORE_BG)),
    // ChangeDirectory
    bold(record(Mode::McqCore, Color::rgb(0xaf, 0x5f, 0x00), CORE_BG)),
    // DisabledInclude
    italic(record(Mode::McqCore, Color::rgb(0x9e, 0x9e, 0x9e), CORE_BG)),
];

impl StyleTag {
    pub const COUNT: usize = 32;

    pub const ALL: [StyleTag; StyleTag::COUNT] = [
        StyleTag::Default,
        StyleTag::Tag,
        StyleTag::Variable,
        StyleTag::InlineExpression,
        StyleTag::Comment,
        StyleTag::Macro,
        StyleTag::LanguageComment,
        StyleTag::PythonBody,
        StyleTag::BlockDelimiter,
        StyleTag::Integer,
        StyleTag::SingleQuoteString,
        StyleTag::DoubleQuoteString,
        StyleTag::TripleSingleQuoteString,
        StyleTag::TripleDoubleQuoteString,
        StyleTag::UnclosedString,
        StyleTag::Keyword,
        StyleTag::Builtin,
        StyleTag::PythonComment,
        StyleTag::CorrectAnswer,
        StyleTag::IncorrectAnswer,
        StyleTag::NeutralizedAnswer,
        StyleTag::ConditionalAnswer,
        StyleTag::AlternativeVersion,
        StyleTag::HeaderBody,
        StyleTag::HeaderDelimiter,
        StyleTag::ConfigKey,
        StyleTag::HeaderComment,
        StyleTag::CoreBody,
        StyleTag::CoreDelimiter,
        StyleTag::Include,
        StyleTag::ChangeDirectory,
        StyleTag::DisabledInclude,
    ];

    pub fn record(self) -> &'static StyleRecord {
        &STYLE_TABLE[self as usize]
    }

    /// The mode this tag implies when read back from a styled buffer.
    pub fn mode(self) -> Mode {
        self.record().mode
    }

    /// The quote sequence that opened a string tag, if this is one.
    pub fn closing_quote(self) -> Option<&'static str> {
        match self {
            StyleTag::SingleQuoteString => Some("'"),
            StyleTag::DoubleQuoteString => Some("\""),
            StyleTag::TripleSingleQuoteString => Some("'''"),
            StyleTag::TripleDoubleQuoteString => Some("\"\"\""),
            _ => None,
        }
    }

    /// String tags for an opening quote lexeme.
    pub fn for_quote(quote: &str) -> Option<StyleTag> {
        match quote {
            "'" => Some(StyleTag::SingleQuoteString),
            "\"" => Some(StyleTag::DoubleQuoteString),
            "'''" => Some(StyleTag::TripleSingleQuoteString),
            "\"\"\"" => Some(StyleTag::TripleDoubleQuoteString),
            _ => None,
        }
    }

    /// Single-line strings are downgraded to [`StyleTag::UnclosedString`] at end of line.
    pub fn is_single_line_string(self) -> bool {
        matches!(
            self,
            StyleTag::SingleQuoteString | StyleTag::DoubleQuoteString
        )
    }

    pub fn is_string(self) -> bool {
        self.closing_quote().is_some() || self == StyleTag::UnclosedString
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_discriminant() {
        for (index, tag) in StyleTag::ALL.iter().enumerate() {
            assert_eq!(*tag as usize, index, "{tag} is out of order");
        }
        assert_eq!(StyleTag::ALL.len(), StyleTag::COUNT);
    }

    #[test]
    fn string_tags_imply_string_mode() {
        for tag in StyleTag::ALL {
            if tag.is_string() {
                assert_eq!(tag.mode(), Mode::PythonString);
            }
        }
    }

    #[test]
    fn quotes_round_trip() {
        for quote in ["'", "\"", "'''", "\"\"\""] {
            let tag = StyleTag::for_quote(quote).unwrap();
            assert_eq!(tag.closing_quote(), Some(quote));
        }
        assert_eq!(StyleTag::for_quote("`"), None);
    }

    #[test]
    fn expression_admits_script_tags() {
        assert!(Mode::Expression.admits(StyleTag::Keyword));
        assert!(Mode::Expression.admits(StyleTag::InlineExpression));
        assert!(!Mode::PythonBlock.admits(StyleTag::InlineExpression));
        assert!(!Mode::Default.admits(StyleTag::Keyword));
    }

    #[test]
    fn colors_display_as_hex() {
        let color = Color::rgb(0x12, 0x34, 0x56);
        assert_eq!(color.to_string(), "#123456");
    }
}
