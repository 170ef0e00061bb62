//! Remote control channel: connection state, receive loop, dispatch.
//!
//! # State Transitions
//! ```text
//! open()                      → Connecting
//! Connecting → Connected      : transport reports the connection (after subscribe)
//! Connected  → Disconnected   : "disconnect" command, close(), or transport loss
//! ```
//!
//! The receive task owns dispatch. It reports state through a `watch`
//! channel and is stopped through a `broadcast` shutdown signal.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::logging::LogSink;
use crate::remote::command::{CommandHandler, CommandTable, InboundCommand};
use crate::remote::topic::ControlTopic;
use crate::remote::transport::{Transport, TransportEvent, TransportLink};
use crate::remote::RemoteError;

/// Connection state of a remote channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

/// Published to the control topic for every `exception`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionNotice {
    pub status: String,
    pub message: String,
}

impl ExceptionNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "exception".to_string(),
            message: message.into(),
        }
    }
}

/// A live remote control connection bound to one topic.
pub struct RemoteChannel {
    topic: ControlTopic,
    transport: Arc<dyn Transport>,
    state: Arc<watch::Sender<ChannelState>>,
    shutdown: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteChannel {
    /// Start the receive task for an already-started transport link.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(topic: ControlTopic, link: TransportLink, commands: Arc<CommandTable>, sink: LogSink) -> Self {
        let (state, _) = watch::channel(ChannelState::Connecting);
        let state = Arc::new(state);
        let (shutdown, shutdown_rx) = broadcast::channel(1);

        let receiver = Receiver {
            topic: topic.clone(),
            transport: link.transport.clone(),
            state: state.clone(),
            commands,
            sink,
        };
        let task = tokio::spawn(receiver.run(link.events, shutdown_rx));

        Self {
            topic,
            transport: link.transport,
            state,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn topic(&self) -> &ControlTopic {
        &self.topic
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    /// Publish an exception notice to the control topic.
    pub async fn publish_exception(&self, message: &str) -> Result<(), RemoteError> {
        if !self.is_connected() {
            return Err(RemoteError::Closed);
        }
        let payload = serde_json::to_vec(&ExceptionNotice::new(message))?;
        self.transport.publish(self.topic.as_str(), payload).await
    }

    /// Stop the receive task and disconnect.
    ///
    /// A dispatch already in progress finishes first; events still queued
    /// behind it are discarded. The state is `Disconnected` afterwards even
    /// if the transport reports an error.
    pub async fn close(&self) -> Result<(), RemoteError> {
        let _ = self.shutdown.send(());

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }

        let result = if self.state() == ChannelState::Disconnected {
            Ok(())
        } else {
            self.transport.disconnect().await
        };
        self.state.send_replace(ChannelState::Disconnected);
        result
    }
}

impl Drop for RemoteChannel {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

impl std::fmt::Debug for RemoteChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteChannel")
            .field("topic", &self.topic)
            .field("state", &self.state())
            .finish()
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Receive side of the channel, moved into the background task.
struct Receiver {
    topic: ControlTopic,
    transport: Arc<dyn Transport>,
    state: Arc<watch::Sender<ChannelState>>,
    commands: Arc<CommandTable>,
    sink: LogSink,
}

impl Receiver {
    async fn run(self, mut events: mpsc::Receiver<TransportEvent>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    self.drain(&mut events);
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        self.state.send_replace(ChannelState::Disconnected);
                        break;
                    };
                    if let Flow::Stop = self.handle(event).await {
                        break;
                    }
                }
            }
        }
    }

    /// Drop queued messages without dispatching them. A queued
    /// disconnect still applies, so `close` sees a dead link as dead.
    fn drain(&self, events: &mut mpsc::Receiver<TransportEvent>) {
        let mut discarded = 0usize;
        while let Ok(event) = events.try_recv() {
            match event {
                TransportEvent::Message { .. } => discarded += 1,
                TransportEvent::Disconnected { reason } => self.on_disconnect(reason),
                TransportEvent::Connected => {}
            }
        }
        if discarded > 0 {
            self.sink.debug(&format!(
                "Remote control stopping, discarded {} pending events",
                discarded
            ));
        }
    }

    async fn handle(&self, event: TransportEvent) -> Flow {
        match event {
            TransportEvent::Connected => {
                self.on_connect().await;
                Flow::Continue
            }
            TransportEvent::Message { topic, payload } => self.on_message(&topic, &payload).await,
            TransportEvent::Disconnected { reason } => {
                self.on_disconnect(reason);
                Flow::Continue
            }
        }
    }

    fn on_disconnect(&self, reason: Option<String>) {
        self.sink.info(&format!(
            "Remote control disconnected from {}: {}",
            self.topic,
            reason.as_deref().unwrap_or("no reason given")
        ));
        self.state.send_replace(ChannelState::Disconnected);
    }

    async fn on_connect(&self) {
        self.sink.debug(&format!("Remote control connected, subscribing to {}", self.topic));
        // A failed subscribe leaves the channel usable for publishing.
        if let Err(e) = self.transport.subscribe(self.topic.as_str()).await {
            self.sink.error(&format!("Failed to subscribe to {}: {}", self.topic, e));
        }
        self.state.send_replace(ChannelState::Connected);
    }

    async fn on_message(&self, topic: &str, body: &[u8]) -> Flow {
        self.sink.debug(&format!(
            "Received remote message on {}: {}",
            topic,
            String::from_utf8_lossy(body)
        ));

        let command = match InboundCommand::decode(body) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                self.sink.error(&format!("Ignoring remote message: {}", e));
                return Flow::Continue;
            }
        };

        let Some(handler) = self.commands.get(&command.function) else {
            self.sink.warning(&format!("Unknown remote command '{}'", command.function));
            return Flow::Continue;
        };

        match handler {
            CommandHandler::Disconnect => {
                self.sink.info("Remote control disconnect requested");
                if let Err(e) = self.transport.disconnect().await {
                    self.sink.error(&format!("Remote disconnect failed: {}", e));
                }
                self.state.send_replace(ChannelState::Disconnected);
                Flow::Stop
            }
            CommandHandler::Echo => {
                self.sink.info(&format!("Remote test command called with payload {}", command.payload));
                Flow::Continue
            }
            CommandHandler::Call(f) => {
                f();
                Flow::Continue
            }
            CommandHandler::CallWithPayload(f) => {
                f(&command.payload);
                Flow::Continue
            }
        }
    }
}
