#![forbid(unsafe_code)]

//! Logging setup.
//!
//! The tapboard crates emit structured events through `tracing` and never
//! install a subscriber themselves. Hosts that want the stock setup enable
//! the `tracing-subscriber` feature and call [`init`] once at startup:
//!
//! ```rust,ignore
//! tapboard_core::logging::init(tapboard_core::logging::LogFormat::Pretty)?;
//! ```
//!
//! The filter is read from `TAPBOARD_LOG` (falling back to `warn`), using the
//! usual `EnvFilter` directive syntax, e.g. `TAPBOARD_LOG=tapboard_input=debug`.

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "TAPBOARD_LOG";

/// Filter applied when [`LOG_ENV`] is unset or empty.
pub const DEFAULT_DIRECTIVES: &str = "warn";

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    #[default]
    Pretty,
    /// Newline-delimited JSON objects.
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Resolve the filter directives from the environment.
#[must_use]
pub fn directives() -> String {
    std::env::var(LOG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string())
}

/// Install a global fmt subscriber.
///
/// Fails if a global subscriber is already set or the directives in
/// [`LOG_ENV`] do not parse.
#[cfg(feature = "tracing-subscriber")]
pub fn init(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(directives())?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.try_init(),
        #[cfg(feature = "tracing-json")]
        LogFormat::Json => builder.json().try_init(),
    }
}
