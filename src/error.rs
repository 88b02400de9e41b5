//! Error types for AnLocales
//!
//! This module defines all custom error types used throughout the library.
//! Error types are organized by category: loading, rule parsing, formatting
//! inputs and configuration. A missing translation is not an error and has
//! no variant here.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type returned by locale operations
#[derive(Error, Debug)]
pub enum LocaleError {
    /// No locale data exists for the requested identifier
    #[error("Locale not found: {name}")]
    NotFound { name: String },

    /// Locale data exists but could not be read or parsed
    #[error("Could not load locale {name}")]
    Load {
        name: String,
        #[source]
        source: DataError,
    },

    /// The name could not be parsed as a locale identifier
    #[error("Invalid locale identifier: {0:?}")]
    InvalidLocaleId(String),

    /// Calendar inputs out of range
    #[error("Invalid date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// A decimal string could not be parsed
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),

    /// The blocking worker running a load panicked or was shut down
    #[error("Background load of {name} failed: {reason}")]
    TaskFailed { name: String, reason: String },
}

/// Reasons a locale bundle is unusable
#[derive(Error, Debug)]
pub enum DataError {
    /// Error reading a data file
    #[error("Could not read file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Data file exceeds the size limit
    #[error("File too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// Data file is not valid UTF-8
    #[error("Data file is not valid UTF-8: {path}")]
    EncodingError { path: PathBuf },

    /// JSON syntax or shape error
    #[error("Invalid data format in {path}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// TOML syntax or shape error in a translation file
    #[error("Invalid translations in {path}")]
    TomlError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A field is present but has an unusable value
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Plural rule grammar error
    #[error(transparent)]
    PluralRules(#[from] PluralRuleError),

    /// Collation tailoring grammar error
    #[error(transparent)]
    Collation(#[from] CollationRuleError),
}

/// Plural rule grammar errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluralRuleError {
    /// Category label is not one of zero/one/two/few/many/other
    #[error("Unknown plural category: {0:?}")]
    UnknownCategory(String),

    /// Clause is missing its `category:` label
    #[error("Plural rule clause has no category: {0:?}")]
    MissingCategory(String),

    /// Unexpected token while parsing a condition
    #[error("Unexpected {found:?} in plural rule, expected {expected}")]
    UnexpectedToken { found: String, expected: &'static str },

    /// Rule ended in the middle of a relation
    #[error("Plural rule ended unexpectedly, expected {0}")]
    UnexpectedEnd(&'static str),

    /// A category was declared twice
    #[error("Plural category declared twice: {0}")]
    DuplicateCategory(String),

    /// `% 0` in a relation
    #[error("Plural rule takes a value modulo zero")]
    ZeroModulus,
}

/// Collation tailoring grammar errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollationRuleError {
    /// Rule text contains an operator without an element after it
    #[error("Collation rule has an operator without an element at offset {0}")]
    MissingElement(usize),

    /// Relation appears before any anchor or element
    #[error("Collation rule {0:?} has no anchor")]
    MissingAnchor(String),
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error loading the settings file
    #[error("Could not load settings: {0}")]
    LoadError(String),

    /// Error parsing the settings file
    #[error("Invalid settings format: {0}")]
    ParseError(String),

    /// Invalid settings value
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// No platform directory could be determined
    #[error("Could not determine platform directory")]
    DirectoryError,
}

/// Result type alias for locale operations
pub type LocaleResult<T> = Result<T, LocaleError>;

/// Result type alias for data parsing
pub type DataResult<T> = Result<T, DataError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl LocaleError {
    /// Wrap a data error as a load failure for `name`
    pub fn load(name: impl Into<String>, source: impl Into<DataError>) -> Self {
        LocaleError::Load {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Full message including the chain of sources
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}
