//! Error types for the reporter subsystem.
//!
//! Startup failures are returned from [`start`](super::FileReporter::start);
//! stream failures are reported to the instance's diagnostic sink instead,
//! because no caller is waiting on an individual write.

use std::path::PathBuf;

use thiserror::Error;

use super::lifecycle::ReporterState;

/// Result type for reporter operations
pub type ReporterResult<T> = Result<T, ReporterError>;

/// Errors that can occur while configuring or running a reporter
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Options failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The target directory could not be listed at startup.
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to, flushing or closing the current output file failed.
    #[error("stream error on {}: {source}", path.display())]
    Stream {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation is not valid in the reporter's current state.
    #[error("cannot {operation} a reporter in state {state}")]
    InvalidState {
        operation: &'static str,
        state: ReporterState,
    },

    /// JSON parsing error (configuration files).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other I/O error (configuration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The queue task ended abnormally.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReporterError {
    /// Whether this error happened before the reporter became active
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ReporterError::Config(_)
                | ReporterError::DirectoryUnreadable { .. }
                | ReporterError::Open { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_stream_error_display() {
        let err = ReporterError::Stream {
            path: PathBuf::from("/var/log/app.001"),
            source: io::Error::new(io::ErrorKind::Other, "device full"),
        };
        let text = err.to_string();
        assert!(text.contains("/var/log/app.001"));
        assert!(text.contains("device full"));
        assert!(!err.is_startup());
    }

    #[test]
    fn test_invalid_state_display() {
        let err = ReporterError::InvalidState {
            operation: "start",
            state: ReporterState::Stopped,
        };
        assert_eq!(err.to_string(), "cannot start a reporter in state stopped");
    }

    #[test]
    fn test_directory_error_is_startup() {
        let err = ReporterError::DirectoryUnreadable {
            path: PathBuf::from("./this/is/fake"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.is_startup());
    }
}
