#![forbid(unsafe_code)]

//! Unified error type for the facade.
//!
//! Each subsystem keeps its own typed error; [`Error`] wraps them so a host
//! can `?` through layout loading and configuration in one function and
//! still match on the domain when it matters.

use std::fmt;

use tapboard_core::config::ConfigError;
use tapboard_layout::LayoutParseError;

/// Top-level error type for tapboard hosts.
#[derive(Debug)]
pub enum Error {
    /// A layout document could not be parsed or found.
    Layout(LayoutParseError),
    /// Configuration failed to load or validate.
    Config(ConfigError),
    /// Raw I/O error (convenience variant for `?` on io::Result).
    Io(std::io::Error),
}

/// Standard result type for tapboard APIs.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Error type label for metrics and tracing.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Layout(_) => "layout",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }

    /// Whether the host can keep running with its current keyboard.
    ///
    /// Layout and config problems leave the installed keyboard untouched;
    /// I/O failures usually mean the host's resources are gone.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

// ── Display ─────────────────────────────────────────────────────────────

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(err) => write!(f, "layout error: {err}"),
            Self::Config(err) => write!(f, "config error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────────

impl From<LayoutParseError> for Error {
    fn from(err: LayoutParseError) -> Self {
        Self::Layout(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn labels_and_sources() {
        let err = Error::from(LayoutParseError::MissingLayout("main".to_owned()));
        assert_eq!(err.error_type(), "layout");
        assert!(err.is_recoverable());
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "layout error: no layout named `main`");

        let err = Error::from(ConfigError::Validation(vec!["debounce_ms is zero".to_owned()]));
        assert_eq!(err.error_type(), "config");
        assert!(err.to_string().contains("debounce_ms"));

        let err = Error::from(std::io::Error::other("gone"));
        assert_eq!(err.error_type(), "io");
        assert!(!err.is_recoverable());
    }
}
