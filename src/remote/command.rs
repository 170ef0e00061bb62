//! Remote commands and the dispatch table.
//!
//! Inbound messages are JSON objects with a `"function"` key naming the
//! command; the whole decoded object is the command payload.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::remote::RemoteError;

/// Tears the channel down. Always present, cannot be replaced.
pub const DISCONNECT: &str = "disconnect";

/// Logs the received payload. Sample of the handler convention.
pub const TEST: &str = "test";

/// What to run when a command arrives.
#[derive(Clone)]
pub enum CommandHandler {
    /// Disconnect from the broker and stop the receive loop.
    Disconnect,
    /// Log the payload at info.
    Echo,
    /// Zero-argument callback.
    Call(Arc<dyn Fn() + Send + Sync>),
    /// Callback receiving the full decoded payload.
    CallWithPayload(Arc<dyn Fn(&Value) + Send + Sync>),
}

impl CommandHandler {
    pub fn call(f: impl Fn() + Send + Sync + 'static) -> Self {
        CommandHandler::Call(Arc::new(f))
    }

    pub fn with_payload(f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        CommandHandler::CallWithPayload(Arc::new(f))
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandHandler::Disconnect => f.write_str("Disconnect"),
            CommandHandler::Echo => f.write_str("Echo"),
            CommandHandler::Call(_) => f.write_str("Call(..)"),
            CommandHandler::CallWithPayload(_) => f.write_str("CallWithPayload(..)"),
        }
    }
}

/// Command name → handler.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: HashMap<String, CommandHandler>,
}

impl CommandTable {
    /// A table with the built-in `disconnect` and `test` commands.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(DISCONNECT.to_string(), CommandHandler::Disconnect);
        entries.insert(TEST.to_string(), CommandHandler::Echo);
        Self { entries }
    }

    /// Add or replace a command. `disconnect` is reserved.
    pub fn register(&mut self, name: &str, handler: CommandHandler) -> Result<(), RemoteError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RemoteError::InvalidCommand(name.to_string()));
        }
        if name == DISCONNECT {
            return Err(RemoteError::ReservedCommand(name.to_string()));
        }
        self.entries.insert(name.to_string(), handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandHandler> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded inbound command.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundCommand {
    pub function: String,
    pub payload: Value,
}

impl InboundCommand {
    /// Decode a message body.
    ///
    /// Returns `Ok(None)` for an object without a string `"function"`;
    /// bodies that are not JSON objects are errors.
    pub fn decode(body: &[u8]) -> Result<Option<Self>, RemoteError> {
        let payload: Value =
            serde_json::from_slice(body).map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let function = match &payload {
            Value::Object(map) => match map.get("function") {
                Some(Value::String(name)) if !name.is_empty() => name.clone(),
                _ => return Ok(None),
            },
            _ => return Err(RemoteError::Malformed("expected a JSON object".to_string())),
        };

        Ok(Some(Self { function, payload }))
    }
}
