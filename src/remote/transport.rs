//! Publish/subscribe transport abstraction.
//!
//! A [`Connector`] starts a non-blocking connection and hands back a
//! [`TransportLink`]: the outbound half (`Transport`) and a stream of
//! inbound [`TransportEvent`]s produced by the transport's own background
//! task.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::RemoteControlConfig;
use crate::remote::RemoteError;

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted the connection.
    Connected,
    /// A message arrived on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
    /// The connection is gone; no reconnect will be attempted.
    Disconnected { reason: Option<String> },
}

/// Outbound operations on a connected client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), RemoteError>;

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), RemoteError>;

    async fn disconnect(&self) -> Result<(), RemoteError>;
}

/// Both halves of a started connection.
pub struct TransportLink {
    pub transport: Arc<dyn Transport>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Starts connections. Must return without waiting for the broker.
pub trait Connector: Send + Sync {
    fn connect(&self, client_id: &str, settings: &RemoteControlConfig) -> Result<TransportLink, RemoteError>;
}
