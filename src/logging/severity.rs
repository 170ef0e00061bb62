//! Severities and level thresholds.

use std::fmt;
use tracing::Level;

/// Severity of a single log line, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// All severities, least severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Label written in the `{levelname}` placeholder.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// The tracing level an event of this severity is emitted at.
    ///
    /// `Critical` has no tracing counterpart and rides on `ERROR`; the
    /// formatter restores the label from the `severity` field.
    pub fn level(self) -> Level {
        match self {
            Severity::Debug => Level::DEBUG,
            Severity::Info => Level::INFO,
            Severity::Warning => Level::WARN,
            Severity::Error | Severity::Critical => Level::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Minimum severity a sink lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Threshold {
    /// No filtering: every severity is written.
    #[default]
    Unset,
    /// Only severities at or above this one are written.
    AtLeast(Severity),
}

impl Threshold {
    /// Resolve a level name (`critical`, `error`, `warning`, `info`,
    /// `debug`, `unset`), ignoring case.
    ///
    /// Unknown names fall back to [`Threshold::Unset`] instead of failing.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "critical" => Threshold::AtLeast(Severity::Critical),
            "error" => Threshold::AtLeast(Severity::Error),
            "warning" => Threshold::AtLeast(Severity::Warning),
            "info" => Threshold::AtLeast(Severity::Info),
            "debug" => Threshold::AtLeast(Severity::Debug),
            _ => Threshold::Unset,
        }
    }

    pub fn admits(self, severity: Severity) -> bool {
        match self {
            Threshold::Unset => true,
            Threshold::AtLeast(min) => severity >= min,
        }
    }
}
