//! Error types for Stiletto
//!
//! Every pipeline stage reports failures through [`StilettoError`]. Each
//! variant corresponds to one error kind and may carry the error that caused
//! it, so the final message reads as a chain from the outermost stage inward.

use thiserror::Error;

/// The kind of a [`StilettoError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    Configuration,
    Manifest,
    TaskConfiguration,
    RunnerConfiguration,
    TaskExecution,
    Io,
}

#[derive(Error, Debug)]
pub enum StilettoError {
    #[error("Argument or input error: {details}{}", render_cause(.cause))]
    Argument {
        details: String,
        #[source]
        cause: Option<Box<StilettoError>>,
    },

    #[error("Configuration error: {details}{}", render_cause(.cause))]
    Configuration {
        details: String,
        #[source]
        cause: Option<Box<StilettoError>>,
    },

    #[error("Manifest error: {details}{}", render_cause(.cause))]
    Manifest {
        details: String,
        #[source]
        cause: Option<Box<StilettoError>>,
    },

    #[error("Task configuration error: {details}{}", render_cause(.cause))]
    TaskConfiguration {
        details: String,
        #[source]
        cause: Option<Box<StilettoError>>,
    },

    #[error("Runner configuration error: {details}{}", render_cause(.cause))]
    RunnerConfiguration {
        details: String,
        #[source]
        cause: Option<Box<StilettoError>>,
    },

    #[error("Task execution error: {details}{}", render_cause(.cause))]
    TaskExecution {
        details: String,
        #[source]
        cause: Option<Box<StilettoError>>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn render_cause(cause: &Option<Box<StilettoError>>) -> String {
    match cause {
        Some(inner) => format!(": {}", inner),
        None => String::new(),
    }
}

impl StilettoError {
    pub fn argument(details: impl Into<String>) -> Self {
        Self::Argument { details: details.into(), cause: None }
    }

    pub fn argument_with(details: impl Into<String>, cause: impl Into<StilettoError>) -> Self {
        Self::Argument { details: details.into(), cause: Some(Box::new(cause.into())) }
    }

    pub fn configuration(details: impl Into<String>) -> Self {
        Self::Configuration { details: details.into(), cause: None }
    }

    pub fn configuration_with(details: impl Into<String>, cause: impl Into<StilettoError>) -> Self {
        Self::Configuration { details: details.into(), cause: Some(Box::new(cause.into())) }
    }

    pub fn manifest(details: impl Into<String>) -> Self {
        Self::Manifest { details: details.into(), cause: None }
    }

    pub fn manifest_with(details: impl Into<String>, cause: impl Into<StilettoError>) -> Self {
        Self::Manifest { details: details.into(), cause: Some(Box::new(cause.into())) }
    }

    pub fn task_configuration(details: impl Into<String>) -> Self {
        Self::TaskConfiguration { details: details.into(), cause: None }
    }

    pub fn task_configuration_with(
        details: impl Into<String>,
        cause: impl Into<StilettoError>,
    ) -> Self {
        Self::TaskConfiguration { details: details.into(), cause: Some(Box::new(cause.into())) }
    }

    pub fn runner_configuration(details: impl Into<String>) -> Self {
        Self::RunnerConfiguration { details: details.into(), cause: None }
    }

    pub fn runner_configuration_with(
        details: impl Into<String>,
        cause: impl Into<StilettoError>,
    ) -> Self {
        Self::RunnerConfiguration { details: details.into(), cause: Some(Box::new(cause.into())) }
    }

    pub fn task_execution(details: impl Into<String>) -> Self {
        Self::TaskExecution { details: details.into(), cause: None }
    }

    pub fn task_execution_with(details: impl Into<String>, cause: impl Into<StilettoError>) -> Self {
        Self::TaskExecution { details: details.into(), cause: Some(Box::new(cause.into())) }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Argument { .. } => ErrorKind::Argument,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Manifest { .. } => ErrorKind::Manifest,
            Self::TaskConfiguration { .. } => ErrorKind::TaskConfiguration,
            Self::RunnerConfiguration { .. } => ErrorKind::RunnerConfiguration,
            Self::TaskExecution { .. } => ErrorKind::TaskExecution,
            Self::IoError(_) => ErrorKind::Io,
        }
    }

    /// The directly wrapped error, if any.
    pub fn cause(&self) -> Option<&StilettoError> {
        match self {
            Self::Argument { cause, .. }
            | Self::Configuration { cause, .. }
            | Self::Manifest { cause, .. }
            | Self::TaskConfiguration { cause, .. }
            | Self::RunnerConfiguration { cause, .. }
            | Self::TaskExecution { cause, .. } => cause.as_deref(),
            Self::IoError(_) => None,
        }
    }

    /// Walks the cause chain and reports whether any link has `kind`.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(err) = current {
            if err.kind() == kind {
                return true;
            }
            current = err.cause();
        }
        false
    }
}

pub type Result<T> = std::result::Result<T, StilettoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_cause() {
        let err = StilettoError::manifest("manifest name is required");
        assert_eq!(err.to_string(), "Manifest error: manifest name is required");
        assert_eq!(err.kind(), ErrorKind::Manifest);
    }

    #[test]
    fn test_display_chains_cause() {
        let inner = StilettoError::manifest("invalid manifest api version: v2");
        let err = StilettoError::configuration_with("cannot build manifest of type 'Task'", inner);
        let msg = err.to_string();
        assert!(msg.starts_with("Configuration error: cannot build manifest"));
        assert!(msg.ends_with("Manifest error: invalid manifest api version: v2"));
    }

    #[test]
    fn test_has_kind_walks_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = StilettoError::task_configuration_with(
            "cannot configure task",
            StilettoError::argument_with("invalid mountdir", io),
        );
        assert!(err.has_kind(ErrorKind::TaskConfiguration));
        assert!(err.has_kind(ErrorKind::Argument));
        assert!(err.has_kind(ErrorKind::Io));
        assert!(!err.has_kind(ErrorKind::Manifest));
    }

    #[test]
    fn test_std_source_chain() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = StilettoError::task_execution_with(
            "task failed",
            StilettoError::argument_with("invalid mountdir", io),
        );

        let first = err.source().unwrap();
        assert!(first.to_string().starts_with("Argument or input error: invalid mountdir"));
        let second = first.source().unwrap();
        assert!(second.to_string().contains("gone"));
        assert!(StilettoError::manifest("plain").source().is_none());
    }

    #[test]
    fn test_io_from() {
        let err: StilettoError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.cause().is_none());
    }
}
