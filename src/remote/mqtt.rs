//! MQTT transport backed by rumqttc.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::validation::MIN_KEEPALIVE_SECS;
use crate::config::RemoteControlConfig;
use crate::remote::transport::{Connector, Transport, TransportEvent, TransportLink};
use crate::remote::RemoteError;

/// Capacity of the client → event loop request queue.
const REQUEST_CAPACITY: usize = 16;

/// Capacity of the event loop → receive task queue.
const EVENT_CAPACITY: usize = 64;

/// Opens MQTT connections on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct MqttConnector;

impl Connector for MqttConnector {
    fn connect(&self, client_id: &str, settings: &RemoteControlConfig) -> Result<TransportLink, RemoteError> {
        let runtime = Handle::try_current().map_err(|_| RemoteError::NoRuntime)?;

        let mut options = MqttOptions::new(client_id, settings.server.clone(), settings.port);
        options.set_keep_alive(Duration::from_secs(
            settings.keepalive_secs.max(MIN_KEEPALIVE_SECS),
        ));
        if let Some((username, password)) = settings.credentials() {
            options.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        runtime.spawn(pump(eventloop, events_tx));

        Ok(TransportLink {
            transport: Arc::new(MqttTransport { client }),
            events: events_rx,
        })
    }
}

/// Outbound half of an MQTT connection.
pub struct MqttTransport {
    client: AsyncClient,
}

#[async_trait]
impl Transport for MqttTransport {
    async fn subscribe(&self, topic: &str) -> Result<(), RemoteError> {
        self.client.subscribe(topic, QoS::AtMostOnce).await?;
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), RemoteError> {
        self.client.publish(topic, QoS::AtMostOnce, false, payload).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), RemoteError> {
        self.client.disconnect().await?;
        Ok(())
    }
}

/// Drive the event loop and forward what matters.
///
/// Stops on the first connection error, after an outgoing DISCONNECT, or
/// when the receive side goes away. rumqttc would reconnect on the next
/// poll; not polling again is what keeps the channel down until it is
/// enabled again.
async fn pump(mut eventloop: EventLoop, events: mpsc::Sender<TransportEvent>) {
    loop {
        let (event, last) = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    (TransportEvent::Connected, false)
                } else {
                    let reason = format!("connection refused: {:?}", ack.code);
                    (TransportEvent::Disconnected { reason: Some(reason) }, true)
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => (
                TransportEvent::Message {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                },
                false,
            ),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => (
                TransportEvent::Disconnected {
                    reason: Some("client disconnected".to_string()),
                },
                true,
            ),
            Ok(_) if events.is_closed() => break,
            Ok(_) => continue,
            Err(e) => (
                TransportEvent::Disconnected {
                    reason: Some(e.to_string()),
                },
                true,
            ),
        };

        if events.send(event).await.is_err() || last {
            break;
        }
    }
}
