//! Per-logger output sink.

use std::sync::Arc;

use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::MakeWriter;

use crate::logging::format::{LineFormat, LineFormatter};
use crate::logging::severity::{Severity, Threshold};

/// A named sink with its own threshold, line format and writer.
///
/// Every sink owns a private `tracing` dispatcher, so several loggers with
/// different levels and formats can live in one process without touching
/// the global subscriber. Cloning is cheap and clones share the writer.
#[derive(Clone)]
pub struct LogSink {
    name: Arc<str>,
    threshold: Threshold,
    dispatch: Dispatch,
}

impl LogSink {
    /// Create a sink writing to an arbitrary `MakeWriter`.
    pub fn with_writer<W>(name: &str, threshold: Threshold, format: LineFormat, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_writer(writer)
            .event_format(LineFormatter::new(name, format))
            .finish();

        Self {
            name: Arc::from(name),
            threshold,
            dispatch: Dispatch::new(subscriber),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Whether a line of this severity would be written.
    pub fn enabled(&self, severity: Severity) -> bool {
        self.threshold.admits(severity)
    }

    /// Write one line at `severity`, if the threshold admits it.
    pub fn log(&self, severity: Severity, message: &str) {
        if !self.enabled(severity) {
            return;
        }

        let label = severity.label();
        tracing::dispatcher::with_default(&self.dispatch, || match severity {
            Severity::Debug => tracing::event!(Level::DEBUG, severity = label, "{}", message),
            Severity::Info => tracing::event!(Level::INFO, severity = label, "{}", message),
            Severity::Warning => tracing::event!(Level::WARN, severity = label, "{}", message),
            Severity::Error | Severity::Critical => {
                tracing::event!(Level::ERROR, severity = label, "{}", message)
            }
        });
    }

    pub fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(Severity::Critical, message);
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish()
    }
}
