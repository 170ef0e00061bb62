//! Control topic naming.

use std::fmt;

/// First segment of every control topic.
pub const TOPIC_PREFIX: &str = "remote_logger";

/// `remote_logger/{host}/{service}/{key}`: the topic a logger listens on
/// and publishes exception notices to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlTopic(String);

impl ControlTopic {
    pub fn new(host: &str, service: &str, control_key: &str) -> Self {
        Self(format!("{}/{}/{}/{}", TOPIC_PREFIX, host, service, control_key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ControlTopic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
