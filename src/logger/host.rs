//! Host alias resolution.

use std::fmt;

/// Name identifying this machine or process instance in topics and alert
/// subjects. Resolved once at startup and passed to every logger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAlias(String);

impl HostAlias {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// The OS hostname, or `localhost` when it cannot be read.
    pub fn resolve() -> Self {
        let hostname = gethostname::gethostname();
        let hostname = hostname.to_string_lossy();
        let hostname = hostname.trim();
        if hostname.is_empty() {
            Self::new("localhost")
        } else {
            Self::new(hostname)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
