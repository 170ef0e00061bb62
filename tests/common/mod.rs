//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

use remote_logger::alerts::{Alert, AlertError, AlertReceipt, AlertSender};
use remote_logger::config::RemoteControlConfig;
use remote_logger::remote::{Connector, RemoteError, Transport, TransportEvent, TransportLink};

/// In-memory output stream for a logger.
#[derive(Clone, Default)]
pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl CaptureWriter {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'w> MakeWriter<'w> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'w self) -> Self::Writer {
        self.clone()
    }
}

/// Alert sender that records every alert and succeeds.
#[derive(Default)]
pub struct RecordingAlerts {
    sent: Mutex<Vec<Alert>>,
}

impl RecordingAlerts {
    pub fn sent(&self) -> Vec<Alert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertSender for RecordingAlerts {
    async fn send(&self, alert: &Alert) -> Result<AlertReceipt, AlertError> {
        self.sent.lock().unwrap().push(alert.clone());
        Ok(AlertReceipt {
            id: Some("<test@mail>".to_string()),
            message: Some("Queued. Thank you.".to_string()),
        })
    }
}

/// Alert sender whose API always answers 500.
pub struct FailingAlerts;

#[async_trait]
impl AlertSender for FailingAlerts {
    async fn send(&self, _alert: &Alert) -> Result<AlertReceipt, AlertError> {
        Err(AlertError::Status {
            status: 500,
            body: "mail api down".to_string(),
        })
    }
}

/// Alert sender that never answers in time.
pub struct SlowAlerts;

#[async_trait]
impl AlertSender for SlowAlerts {
    async fn send(&self, _alert: &Alert) -> Result<AlertReceipt, AlertError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(AlertReceipt::default())
    }
}

/// Which outbound calls a [`FakeTransport`] rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub subscribe: bool,
    pub publish: bool,
    pub disconnect: bool,
}

/// Transport that records outbound calls, failing the ones selected in
/// its [`Failures`] with `RemoteError::Closed`.
#[derive(Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<String>>,
    failures: Failures,
}

impl FakeTransport {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn subscribe(&self, topic: &str) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(format!("subscribe {}", topic));
        outcome(self.failures.subscribe)
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), RemoteError> {
        let payload = String::from_utf8_lossy(&payload).into_owned();
        self.calls.lock().unwrap().push(format!("publish {} {}", topic, payload));
        outcome(self.failures.publish)
    }

    async fn disconnect(&self) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push("disconnect".to_string());
        outcome(self.failures.disconnect)
    }
}

fn outcome(fail: bool) -> Result<(), RemoteError> {
    if fail {
        Err(RemoteError::Closed)
    } else {
        Ok(())
    }
}

/// One connection handed out by [`FakeConnector`].
#[derive(Clone)]
pub struct FakeConnection {
    pub client_id: String,
    pub transport: Arc<FakeTransport>,
    pub events: mpsc::Sender<TransportEvent>,
}

impl FakeConnection {
    pub async fn emit(&self, event: TransportEvent) {
        self.events.send(event).await.unwrap();
    }

    pub async fn deliver(&self, topic: &str, payload: &str) {
        self.emit(TransportEvent::Message {
            topic: topic.to_string(),
            payload: payload.as_bytes().to_vec(),
        })
        .await;
    }
}

/// Connector that never touches the network.
#[derive(Default)]
pub struct FakeConnector {
    connections: Mutex<Vec<FakeConnection>>,
    failures: Failures,
}

impl FakeConnector {
    /// Connector whose transports reject the calls in `failures`.
    pub fn failing(failures: Failures) -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
            failures,
        }
    }

    pub fn connections(&self) -> Vec<FakeConnection> {
        self.connections.lock().unwrap().clone()
    }

    pub fn last(&self) -> FakeConnection {
        self.connections.lock().unwrap().last().cloned().expect("no connection made")
    }
}

impl Connector for FakeConnector {
    fn connect(&self, client_id: &str, _settings: &RemoteControlConfig) -> Result<TransportLink, RemoteError> {
        let transport = Arc::new(FakeTransport {
            calls: Mutex::new(Vec::new()),
            failures: self.failures,
        });
        let (tx, rx) = mpsc::channel(16);
        self.connections.lock().unwrap().push(FakeConnection {
            client_id: client_id.to_string(),
            transport: transport.clone(),
            events: tx,
        });
        Ok(TransportLink {
            transport,
            events: rx,
        })
    }
}

/// Raw HTTP request as seen by [`start_mail_api`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// Start a mock mail API on an ephemeral port that answers every request
/// with `status` and `body`, and forwards the requests it saw.
pub async fn start_mail_api(
    status: u16,
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let _ = tx.send(request);

                        let status_text = match status {
                            200 => "200 OK",
                            401 => "401 Unauthorized",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let request = CapturedRequest {
        head,
        body: String::new(),
    };
    let content_length = request
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        body: String::from_utf8_lossy(&buf[header_end..]).into_owned(),
        ..request
    })
}
