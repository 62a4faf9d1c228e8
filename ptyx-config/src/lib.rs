//! Shared configuration loader for the ptyx lexer toolchain.
//!
//! `defaults/ptyx.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`PtyxConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/ptyx.default.toml");

/// Top-level configuration consumed by ptyx applications.
#[derive(Debug, Clone, Deserialize)]
pub struct PtyxConfig {
    pub checker: ToolConfig,
    pub formatter: ToolConfig,
    pub blocks: BlocksConfig,
    pub grammar: GrammarConfig,
}

/// An external batch tool: text goes in through stdin, results come out of stdout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolConfig {
    pub program: String,
    pub args: Vec<String>,
}

/// Knobs for embedded code-block extraction and reassembly.
#[derive(Debug, Clone, Deserialize)]
pub struct BlocksConfig {
    /// Number of dots written back when a block delimiter is normalized.
    pub delimiter_length: usize,
    /// Identifier substituted for `let` directives while an external tool runs.
    pub sentinel: String,
}

/// Extra entries merged into the built-in ptyx grammar registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub argument_tags: Vec<String>,
    pub plain_tags: Vec<String>,
    pub builtins: Vec<String>,
    pub config_keys: Vec<String>,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<PtyxConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<PtyxConfig, ConfigError> {
    Loader::new().build()
}
