#![forbid(unsafe_code)]

//! Layout parse errors.
//!
//! Only structural problems surface as errors. A malformed individual
//! attribute never aborts a parse: it falls back to the inherited or default
//! value (see [`crate::source`]).

use thiserror::Error;

/// A layout document could not be turned into a keyboard.
///
/// When any of these is returned no keyboard was built, so the caller keeps
/// whatever keyboard it had installed.
#[derive(Debug, Error)]
pub enum LayoutParseError {
    /// The document is not well-formed TOML (e.g. an unterminated table).
    #[error("layout syntax error: {0}")]
    Syntax(#[from] toml::de::Error),
    /// A table or table array the layout schema does not know.
    #[error("unknown element `{name}` in {parent}")]
    UnknownElement { parent: String, name: String },
    /// A key declared outside of any row.
    #[error("key declared outside of a row")]
    KeyOutsideRow,
    /// An element with the wrong shape (e.g. `row` as a scalar).
    #[error("malformed element `{name}`: expected {expected}")]
    MalformedElement {
        name: String,
        expected: &'static str,
    },
    /// A layout referenced by name is not in the library.
    #[error("no layout named `{0}`")]
    MissingLayout(String),
    /// I/O error reading a layout file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutParseError>;
