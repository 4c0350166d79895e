//! Structured logging setup
//!
//! Logs go to stderr so that reports printed on stdout stay machine readable.

use std::io::IsTerminal;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `--log-level` nor `-v` is given.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Filter used by `-v`.
pub const VERBOSE_DIRECTIVE: &str = "debug";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log format '{0}' (expected text or json)")]
    UnknownFormat(String),
    #[error("invalid log filter '{directive}': {reason}")]
    BadFilter { directive: String, reason: String },
    #[error("logging is already installed: {0}")]
    AlreadyInstalled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::UnknownFormat(s.to_string())),
        }
    }
}

/// How the process logs, as chosen on the command line.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive from `--log-level`, e.g. `stiletto=trace`
    pub filter: Option<String>,
    /// `-v`: debug logs with event targets
    pub verbose: bool,
    pub ansi: bool,
}

impl LogSettings {
    pub fn from_cli(filter: Option<&str>, format: &str, verbose: bool) -> Result<Self, LoggingError> {
        Ok(Self {
            format: format.parse()?,
            filter: filter.map(str::trim).filter(|f| !f.is_empty()).map(String::from),
            verbose,
            ansi: std::io::stderr().is_terminal(),
        })
    }

    /// An explicit filter wins over `-v`.
    pub fn directive(&self) -> &str {
        match (&self.filter, self.verbose) {
            (Some(filter), _) => filter,
            (None, true) => VERBOSE_DIRECTIVE,
            (None, false) => DEFAULT_DIRECTIVE,
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let directive = self.directive();
        EnvFilter::try_new(directive).map_err(|e| LoggingError::BadFilter {
            directive: directive.to_string(),
            reason: e.to_string(),
        })
    }

    /// Install the global subscriber. Fails if one is already set.
    pub fn install(&self) -> Result<(), LoggingError> {
        let filter = self.env_filter()?;

        let (text, json) = match self.format {
            LogFormat::Text => (
                Some(fmt::layer().with_writer(std::io::stderr).with_ansi(self.ansi).with_target(self.verbose)),
                None,
            ),
            LogFormat::Json => (
                None,
                Some(fmt::layer().json().with_writer(std::io::stderr).with_target(self.verbose)),
            ),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(text)
            .with(json)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))
    }
}
