//! Remote-controllable application logger.
//!
//! A named logger with per-instance level and line format, email alerts on
//! exceptions, an optional "service started" notice, and an MQTT control
//! channel for remote commands.

pub mod alerts;
pub mod config;
pub mod error;
pub mod logger;
pub mod logging;
pub mod remote;

pub use alerts::{AlertSender, CustomErrorHandler, ErrorContext, HandlerError, TraceFormatter};
pub use config::LoggerConfig;
pub use error::LoggerError;
pub use logger::{AppLogger, HostAlias};
pub use remote::{ChannelState, CommandHandler, RemoteChannel};
