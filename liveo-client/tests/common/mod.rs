//! Common test utilities for liveo-client integration tests
//!
//! Two ways to stand in for the result server:
//!
//! - [`ScriptedConnector`]: in-process channels, no socket. Each successful
//!   open hands a [`ServerSession`] to the test, which can then read what the
//!   client sent and push frames or a close back.
//! - [`MockWsServer`]: a real WebSocket listener on localhost, used to
//!   exercise [`WsConnector`](liveo_client::WsConnector) end to end.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use liveo_client::{ChannelEvent, ChannelHandle, Connector};
use liveo_core::{codec, ApiResponse, Error, EventMessage, Result};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// How long helpers wait before giving up
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Connector backed by in-memory channels
#[derive(Clone)]
pub struct ScriptedConnector {
    refuse: Arc<AtomicU32>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    sessions: mpsc::UnboundedSender<ServerSession>,
}

/// Test-side view of a [`ScriptedConnector`]
pub struct ScriptedServer {
    refuse: Arc<AtomicU32>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    sessions: mpsc::UnboundedReceiver<ServerSession>,
}

impl ScriptedConnector {
    pub fn new() -> (Self, ScriptedServer) {
        let refuse = Arc::new(AtomicU32::new(0));
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                refuse: Arc::clone(&refuse),
                attempts: Arc::clone(&attempts),
                sessions: tx,
            },
            ScriptedServer {
                refuse,
                attempts,
                sessions: rx,
            },
        )
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self) -> Result<ChannelHandle> {
        self.attempts.lock().unwrap().push(Instant::now());

        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(Error::WebSocket("connection refused".to_string()));
        }

        let (handle, sent, events) = ChannelHandle::pair();
        self.sessions
            .send(ServerSession { sent, events })
            .map_err(|_| Error::WebSocket("server gone".to_string()))?;
        Ok(handle)
    }
}

impl ScriptedServer {
    /// Refuse the next `n` connection attempts
    pub fn refuse_next(&self, n: u32) {
        self.refuse.store(n, Ordering::SeqCst);
    }

    /// Wait for the client's next successful open
    pub async fn next_session(&mut self) -> ServerSession {
        self.next_session_within(TIMEOUT).await
    }

    pub async fn next_session_within(&mut self, limit: Duration) -> ServerSession {
        tokio::time::timeout(limit, self.sessions.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("connector dropped")
    }

    /// Times at which the client tried to connect
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    /// Gaps between consecutive attempts
    pub fn attempt_gaps(&self) -> Vec<Duration> {
        self.attempts().windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Server end of one open channel
pub struct ServerSession {
    sent: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl ServerSession {
    /// Next frame the client sent
    pub async fn recv(&mut self) -> String {
        tokio::time::timeout(TIMEOUT, self.sent.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client dropped the channel")
    }

    /// Next frame the client sent, parsed as JSON
    pub async fn recv_json(&mut self) -> Value {
        serde_json::from_str(&self.recv().await).unwrap()
    }

    /// A frame the client already sent, without waiting
    pub fn try_recv(&mut self) -> Option<String> {
        self.sent.try_recv().ok()
    }

    pub fn push_raw(&self, text: impl Into<String>) {
        let _ = self.events.send(ChannelEvent::Message(text.into()));
    }

    pub fn push_event(&self, name: &str, data: Value) {
        self.push_raw(codec::encode_event(&EventMessage::new(name, data)).unwrap());
    }

    pub fn respond(&self, tag: u64, result: Value) {
        self.push_raw(codec::encode_api_response(&ApiResponse::success(tag, result)).unwrap());
    }

    pub fn respond_error(&self, tag: u64, message: &str) {
        self.push_raw(codec::encode_api_response(&ApiResponse::failure(tag, message)).unwrap());
    }

    pub fn push_error(&self, message: &str) {
        let _ = self.events.send(ChannelEvent::Error(message.to_string()));
    }

    /// Close the channel from the server side
    pub fn close(self) {
        let _ = self.events.send(ChannelEvent::Closed);
    }
}

/// Mock WebSocket server for client testing
///
/// Every text frame received is forwarded to the test, then passed to the
/// handler; whatever the handler returns is written back. `greeting` frames
/// are sent to each new connection before anything is read.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    message_rx: mpsc::Receiver<String>,
}

impl MockWsServer {
    /// Server that answers nothing
    pub async fn new(greeting: Vec<String>) -> Self {
        Self::with_handler(greeting, |_| None).await
    }

    pub async fn with_handler<F>(greeting: Vec<String>, handler: F) -> Self
    where
        F: Fn(String) -> Option<String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (msg_tx, message_rx) = mpsc::channel::<String>(100);
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let msg_tx = msg_tx.clone();
                        let handler = Arc::clone(&handler);
                        let greeting = greeting.clone();

                        tokio::spawn(async move {
                            let Ok(ws_stream) = accept_async(stream).await else { return };
                            let (mut write, mut read) = ws_stream.split();

                            for frame in greeting {
                                if write.send(Message::Text(frame)).await.is_err() {
                                    return;
                                }
                            }

                            while let Some(Ok(msg)) = read.next().await {
                                if let Message::Text(text) = msg {
                                    let _ = msg_tx.send(text.clone()).await;
                                    if let Some(reply) = handler(text) {
                                        let _ = write.send(Message::Text(reply)).await;
                                    }
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            message_rx,
        }
    }

    /// WebSocket URL for this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Wait for the next text frame received from any client
    pub async fn wait_for_message(&mut self) -> Option<String> {
        tokio::time::timeout(TIMEOUT, self.message_rx.recv()).await.ok().flatten()
    }

    /// Stop accepting connections
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// `{"Hash": hash, "Results": {...}}` with one course of `names`
pub fn full_results(hash: u64, names: &[&str]) -> Value {
    let competitors: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| serde_json::json!({"Name": name, "Time": (i as i64 + 1) * 60_000_000_000i64}))
        .collect();
    serde_json::json!({
        "Hash": hash,
        "Results": {"Title": "Test Race", "Courses": [{"Title": "Brown", "Competitors": competitors}]}
    })
}

/// Wait until `check` holds, polling the runtime
pub async fn eventually<F: Fn() -> bool>(check: F) {
    tokio::time::timeout(TIMEOUT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
