//! Error context captured by `exception` and its text/HTML renderings.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

/// The error being reported, with everything captured at the call site.
pub struct ErrorContext<'a> {
    message: String,
    error: &'a (dyn Error + Send + Sync + 'static),
    backtrace: Backtrace,
    occurred_at: DateTime<Utc>,
}

impl<'a> ErrorContext<'a> {
    /// Capture a context for `error`. The backtrace honours
    /// `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`.
    pub fn capture(message: impl Into<String>, error: &'a (dyn Error + Send + Sync + 'static)) -> Self {
        Self {
            message: message.into(),
            error,
            backtrace: Backtrace::capture(),
            occurred_at: Utc::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw error, e.g. for `downcast_ref`.
    pub fn error(&self) -> &'a (dyn Error + Send + Sync + 'static) {
        self.error
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// The error followed by its chain of sources.
    pub fn chain(&self) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
        let first: &'a (dyn Error + 'static) = self.error;
        std::iter::successors(Some(first), |e| {
            let e: &'a (dyn Error + 'static) = *e;
            e.source()
        })
    }
}

impl std::fmt::Debug for ErrorContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorContext")
            .field("message", &self.message)
            .field("error", &self.error.to_string())
            .field("occurred_at", &self.occurred_at)
            .finish()
    }
}

/// Renders an [`ErrorContext`] for log lines and alert bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceFormatter;

impl TraceFormatter {
    /// Plain-text rendering: the error, its causes, and the backtrace when
    /// one was captured.
    pub fn text(&self, context: &ErrorContext<'_>) -> String {
        let mut out = format!("Error: {}", context.error);

        let causes: Vec<_> = context.chain().skip(1).collect();
        if !causes.is_empty() {
            out.push_str("\n\nCaused by:");
            for (i, cause) in causes.iter().enumerate() {
                let _ = write!(out, "\n    {}: {}", i, cause);
            }
        }

        if context.backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(out, "\n\nStack backtrace:\n{}", context.backtrace);
        }
        out
    }

    /// HTML rendering used as the alert body.
    pub fn html(&self, context: &ErrorContext<'_>) -> String {
        let mut out = String::from("<body>");
        let _ = write!(
            out,
            "<h3>{}</h3><p>Occurred at: {} UTC</p><ol>",
            escape_html(&context.message),
            context.occurred_at.format("%Y-%m-%d %H:%M:%S%.6f"),
        );
        for error in context.chain() {
            let _ = write!(out, "<li>{}</li>", escape_html(&error.to_string()));
        }
        out.push_str("</ol>");

        if context.backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(
                out,
                "<pre>{}</pre>",
                escape_html(&context.backtrace.to_string())
            );
        }
        out.push_str("</body>");
        out
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
