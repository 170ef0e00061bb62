//! Line templates and the event formatter that renders them.
//!
//! A template is free text with named placeholders:
//! `{asctime}`, `{name}`, `{levelname}` and `{message}`.
//! Unknown placeholders are kept as literal text.

use std::fmt::{self, Write as _};

use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Template used when the configuration does not provide one.
pub const DEFAULT_FORMAT: &str = "{asctime} : {name} : {levelname} : {message}";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Timestamp,
    Name,
    Level,
    Message,
}

/// A parsed line template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    segments: Vec<Segment>,
}

impl LineFormat {
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                literal.push_str(&rest[open..]);
                rest = "";
                break;
            };

            let placeholder = match &after[..close] {
                "asctime" => Some(Segment::Timestamp),
                "name" => Some(Segment::Name),
                "levelname" => Some(Segment::Level),
                "message" => Some(Segment::Message),
                _ => None,
            };

            match placeholder {
                Some(segment) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                None => literal.push_str(&rest[open..open + close + 2]),
            }
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// True if the template prints the message text somewhere.
    pub fn has_message(&self) -> bool {
        self.segments.contains(&Segment::Message)
    }

    /// Render one line (without the trailing newline).
    pub fn render<W: fmt::Write>(
        &self,
        out: &mut W,
        timestamp: &dyn fmt::Display,
        name: &str,
        level: &str,
        message: &str,
    ) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.write_str(text)?,
                Segment::Timestamp => write!(out, "{}", timestamp)?,
                Segment::Name => out.write_str(name)?,
                Segment::Level => out.write_str(level)?,
                Segment::Message => out.write_str(message)?,
            }
        }
        Ok(())
    }
}

impl Default for LineFormat {
    fn default() -> Self {
        Self::parse(DEFAULT_FORMAT)
    }
}

/// `FormatEvent` implementation writing events through a [`LineFormat`].
pub struct LineFormatter {
    name: String,
    format: LineFormat,
}

impl LineFormatter {
    pub fn new(name: impl Into<String>, format: LineFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }
}

#[derive(Default)]
struct LineFields {
    message: String,
    severity: Option<String>,
}

impl Visit for LineFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "severity" => self.severity = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => {
                self.message.clear();
                let _ = write!(self.message, "{:?}", value);
            }
            "severity" => self.severity = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = LineFields::default();
        event.record(&mut fields);

        let level = match fields.severity {
            Some(label) => label,
            None => match *event.metadata().level() {
                tracing::Level::WARN => "WARNING".to_string(),
                level => level.to_string(),
            },
        };

        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        self.format
            .render(&mut writer, &timestamp, &self.name, &level, &fields.message)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: &LineFormat) -> String {
        let mut out = String::new();
        format
            .render(&mut out, &"2024-01-01 00:00:00,000", "svc", "INFO", "hello")
            .unwrap();
        out
    }

    #[test]
    fn test_default_format() {
        assert_eq!(
            render(&LineFormat::default()),
            "2024-01-01 00:00:00,000 : svc : INFO : hello"
        );
    }

    #[test]
    fn test_unknown_placeholder_is_literal() {
        let format = LineFormat::parse("[{levelname}] {thread} {message}");
        assert_eq!(render(&format), "[INFO] {thread} hello");
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let format = LineFormat::parse("{message} {oops");
        assert_eq!(render(&format), "hello {oops");
    }

    #[test]
    fn test_has_message() {
        assert!(LineFormat::default().has_message());
        assert!(!LineFormat::parse("{asctime} {name}").has_message());
    }
}
