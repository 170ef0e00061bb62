//! Logger facade subsystem.
//!
//! # Data Flow
//! ```text
//! application code
//!     → facade.rs (AppLogger: info / debug / warning / error / critical)
//!         → logging::LogSink
//!     → facade.rs (AppLogger::exception)
//!         → logging::LogSink (message + error chain)
//!         → remote::RemoteChannel (exception notice, when connected)
//!         → alerts (custom handler, or default email)
//! ```
//!
//! # Design Decisions
//! - One logger per service; the host alias is passed in, never global
//! - Logging calls never fail
//! - `exception` only fails when a custom handler fails

pub mod facade;
pub mod host;

pub use facade::AppLogger;
pub use host::HostAlias;
