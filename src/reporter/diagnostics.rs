//! Diagnostic sinks
//!
//! Failures that happen after `start` returned have no caller to go back
//! to. They are reported to the instance's sink instead.

use parking_lot::Mutex;
use tracing::error;

use super::error::ReporterError;

/// Receives steady-state errors of one reporter instance
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, error: &ReporterError);
}

/// Sink that logs through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, err: &ReporterError) {
        error!(error = %err, "file reporter stopped persisting events");
    }
}

/// Sink that keeps every report in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered messages of all reports so far
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }

    /// Number of reports so far
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, error: &ReporterError) {
        self.reports.lock().push(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_records_reports() {
        let sink = CollectingSink::new();
        assert!(sink.is_empty());

        sink.report(&ReporterError::Internal("boom".to_string()));
        TracingSink.report(&ReporterError::Internal("logged".to_string()));

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.reports(), vec!["internal error: boom".to_string()]);
    }
}
