//! Remote control subsystem.
//!
//! # Data Flow
//! ```text
//! AppLogger::enable_remote_control(settings)
//!     → topic.rs (remote_logger/{host}/{service}/{key})
//!     → Connector::connect (mqtt.rs: rumqttc client + event loop pump task)
//!     → channel.rs (receive task)
//!
//! Broker → pump → TransportEvent (mpsc)
//!     → Connected: subscribe to own topic, state = Connected (watch)
//!     → Message:   command.rs (decode JSON, look up "function", dispatch)
//!     → Disconnected: state = Disconnected
//!
//! AppLogger::exception → RemoteChannel::publish_exception
//!     → {"status": "exception", "message": ...} on the same topic
//! ```
//!
//! # Design Decisions
//! - Connection is non-blocking; enable returns before the broker answers
//! - No automatic reconnect; re-enable to reconnect
//! - The command table is an immutable snapshot per channel
//! - Malformed messages are logged and never stop the receive loop

pub mod channel;
pub mod command;
pub mod mqtt;
pub mod topic;
pub mod transport;

use thiserror::Error;

pub use channel::{ChannelState, ExceptionNotice, RemoteChannel};
pub use command::{CommandHandler, CommandTable, InboundCommand, DISCONNECT, TEST};
pub use mqtt::MqttConnector;
pub use topic::ControlTopic;
pub use transport::{Connector, Transport, TransportEvent, TransportLink};

/// Errors that can occur in the remote control channel.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Command names must be non-empty.
    #[error("Invalid command name '{0}'")]
    InvalidCommand(String),

    /// The name belongs to a built-in command that cannot be replaced.
    #[error("Command '{0}' is reserved")]
    ReservedCommand(String),

    /// An inbound message could not be decoded.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// An outbound payload could not be encoded.
    #[error("Payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The MQTT client rejected a request.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// The channel is not connected.
    #[error("Remote channel is not connected")]
    Closed,

    /// Connecting requires a running tokio runtime.
    #[error("Remote control requires a tokio runtime")]
    NoRuntime,
}
