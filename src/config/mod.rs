//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LoggerConfig (validated, immutable)
//!     → AppLogger::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a logger is built from one snapshot
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AlertConfig;
pub use schema::LoggerConfig;
pub use schema::RemoteControlConfig;
pub use validation::{validate_config, ValidationError};
