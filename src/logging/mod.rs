//! Log output subsystem.
//!
//! # Data Flow
//! ```text
//! AppLogger::info / debug / ... / exception
//!     → sink.rs (threshold check, emit tracing event on the sink's own dispatcher)
//!     → format.rs (LineFormatter renders the line template)
//!     → MakeWriter (stdout by default)
//! ```
//!
//! # Design Decisions
//! - Built on tracing + tracing-subscriber, one `Dispatch` per logger
//! - Thresholds are checked before an event is built; unknown level names
//!   mean "no filtering"
//! - The `severity` field carries the label, so CRITICAL survives the
//!   mapping onto tracing's five levels

pub mod format;
pub mod severity;
pub mod sink;

pub use format::{LineFormat, DEFAULT_FORMAT};
pub use severity::{Severity, Threshold};
pub use sink::LogSink;
