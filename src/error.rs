//! Error types.
//!
//! Parsing and resolution are best-effort and never fail; the only fallible
//! operation is bootstrapping the parser tables, whose errors are collected
//! in `CalcError`. The type is `Clone` so a cached bootstrap failure can be
//! handed to every later caller.

use thiserror::Error;

/// Errors raised while loading or compiling parser tables.
///
/// # Examples
///
/// ```rust
/// use modcalc::CalcError;
///
/// let err = CalcError::UnknownFlag("SPEAR".into());
/// assert_eq!(err.to_string(), "Unknown flag name in parser tables: SPEAR");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    /// The table file could not be read.
    #[error("Failed to read parser tables from {path}: {message}")]
    TableIo { path: String, message: String },

    /// The table document is not valid JSON for `ParserTables`.
    #[error("Malformed parser tables: {0}")]
    TableFormat(String),

    /// A form, phrase, or cache pattern did not compile.
    #[error("Invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A flag or keyword-flag name does not exist.
    #[error("Unknown flag name in parser tables: {0}")]
    UnknownFlag(String),

    /// A condition entry is inconsistent (for example a `#` placeholder in a
    /// condition that takes no number).
    #[error("Invalid condition entry {phrase:?}: {message}")]
    InvalidCondition { phrase: String, message: String },
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::TableFormat(err.to_string())
    }
}
