//! Reconnecting live-results client
//!
//! `LiveoClient` keeps one logical connection to the result server alive for
//! as long as the process runs and multiplexes three kinds of traffic over it:
//!
//! - **API calls**: tagged requests, each settled exactly once by the response
//!   carrying the same tag
//! - **Events**: named pushes fanned out to subscribers
//! - **Errors**: server-reported failures, logged
//!
//! # Client Lifecycle
//!
//! 1. **Build**: `ClientBuilder` picks the connector, schedule and policies
//! 2. **Connect**: `connect()` starts the driver task (once; later calls are no-ops)
//! 3. **Run**: the driver opens channels, dispatches frames and reconnects
//!    after every drop following the reconnection schedule
//! 4. **Shutdown**: `shutdown()` stops the driver and drops the channel
//!
//! # Cloning
//!
//! `LiveoClient` is cheap to clone; all clones share the same connection,
//! pending-request table and handler registries.

use crate::channel::{ChannelEvent, ChannelHandle, Connector};
use crate::connection_state::{ConnectionManager, ConnectionState};
use crate::events::{EventDispatcher, LifecycleListeners};
use crate::request::{ApiCall, RequestManager};
use crate::subscription::Subscription;
use crate::ClientMetrics;
use liveo_core::{codec, Error, Inbound, Result};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Live-results client over a reconnecting channel
#[derive(Clone)]
pub struct LiveoClient {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    connector: Arc<dyn Connector>,
    connection: ConnectionManager,
    requests: RequestManager,
    events: EventDispatcher,
    lifecycle: LifecycleListeners,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    fail_pending_on_disconnect: bool,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
    started: AtomicBool,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl LiveoClient {
    pub(crate) fn from_parts(
        connector: Arc<dyn Connector>,
        connection: ConnectionManager,
        fail_pending_on_disconnect: bool,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                connection,
                requests: RequestManager::new(),
                events: EventDispatcher::new(),
                lifecycle: LifecycleListeners::default(),
                outbound: Mutex::new(None),
                fail_pending_on_disconnect,
                metrics,
                started: AtomicBool::new(false),
                driver: Mutex::new(None),
            }),
        }
    }

    /// Start connecting in the background
    ///
    /// Must be called from within a Tokio runtime. Only the first call has an
    /// effect; reconnects after that are automatic.
    pub fn connect(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("connect() called again, ignoring");
            return;
        }
        let handle = tokio::spawn(Inner::drive(Arc::clone(&self.inner)));
        *self.inner.driver.lock() = Some(handle);
    }

    /// Stop the driver task and drop the current channel
    ///
    /// The client cannot be connected again afterwards.
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.driver.lock().take() {
            handle.abort();
        }
        self.inner.outbound.lock().take();
        self.inner.connection.stopped();
        self.inner.record_state();
        if self.inner.fail_pending_on_disconnect {
            self.inner.requests.fail_all(Error::ConnectionClosed);
        }
        tracing::info!("Client shut down");
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Receiver that observes every connection state change
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Number of API requests still waiting for a response
    pub fn pending_requests(&self) -> usize {
        self.inner.requests.pending_count()
    }

    /// Send a raw text frame
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] when no channel is open; nothing is queued.
    pub fn send_raw(&self, text: impl Into<String>) -> Result<()> {
        self.inner.send_raw(text.into())
    }

    /// Send an API request and return the pending call
    ///
    /// The tag is allocated and the frame written before this returns. If no
    /// channel is open the returned call is already rejected with
    /// [`Error::NotConnected`].
    pub fn send_api_request(&self, action: &str, params: Value) -> ApiCall {
        let requests = &self.inner.requests;
        let tag = requests.next_tag();

        let frame = match codec::encode_api_request(tag, action, params) {
            Ok(frame) => frame,
            Err(e) => return ApiCall::failed(tag, e),
        };

        let rx = requests.register(tag);
        if let Err(e) = self.inner.send_raw(frame) {
            tracing::debug!(tag, action, "API request not sent, channel closed");
            requests.fail(tag, e);
        }
        ApiCall::pending(tag, rx)
    }

    /// Send an API request and decode its result
    #[tracing::instrument(skip(self, params))]
    pub async fn request<P, R>(&self, action: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let start = Instant::now();
        let params = serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;

        let call = self.send_api_request(action, params);
        let tag = call.tag();
        let outcome = call.await;
        let duration = start.elapsed().as_secs_f64();

        match outcome {
            Ok(result) => {
                if let Some(ref m) = self.inner.metrics {
                    m.record_request(action, "success", duration);
                }
                tracing::debug!(tag, duration_secs = duration, "Request completed");
                serde_json::from_value(result).map_err(|e| Error::Serialization(e.to_string()))
            }
            Err(e) => {
                if let Some(ref m) = self.inner.metrics {
                    m.record_request(action, "error", duration);
                }
                tracing::debug!(tag, error = %e, "Request failed");
                Err(e)
            }
        }
    }

    /// Call `handler` every time a channel opens
    pub fn on_open<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.lifecycle.on_open(Arc::new(handler))
    }

    /// Call `handler` after every closed channel or failed connect attempt
    pub fn on_close<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.lifecycle.on_close(Arc::new(handler))
    }

    /// Call `handler` with the text of every channel or connect error
    pub fn on_error<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.lifecycle.on_error(Arc::new(handler))
    }

    /// Call `handler` with the `Data` of every event called `name`
    pub fn on_event<F>(&self, name: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.events.register(name, handler)
    }

    /// The event registry
    pub fn events(&self) -> &EventDispatcher {
        &self.inner.events
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }
}

impl Inner {
    fn send_raw(&self, text: String) -> Result<()> {
        match self.outbound.lock().as_ref() {
            Some(tx) if self.connection.state().is_open() => tx.send(text).map_err(|_| Error::NotConnected),
            _ => Err(Error::NotConnected),
        }
    }

    fn record_state(&self) {
        if let Some(ref m) = self.metrics {
            m.update_connection_state(self.connection.state().gauge_value());
        }
    }

    /// Connect, serve, wait, repeat
    async fn drive(self: Arc<Self>) {
        let mut sessions: u64 = 0;
        loop {
            let delay = self.connection.next_delay();
            if !delay.is_zero() {
                tracing::info!(
                    delay_ms = delay.as_millis() as u64,
                    attempt = self.connection.failures(),
                    "Reconnecting"
                );
                tokio::time::sleep(delay).await;
            }

            let failures = self.connection.connecting();
            self.record_state();
            if sessions > 0 || failures > 0 {
                if let Some(ref m) = self.metrics {
                    m.record_reconnection_attempt();
                }
            }

            let failures = match self.connector.open().await {
                Ok(handle) => {
                    sessions += 1;
                    self.serve(handle, sessions > 1 || failures > 0).await;
                    0
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt = failures + 1, "Connection attempt failed");
                    if let Some(ref m) = self.metrics {
                        m.record_error("connect");
                    }
                    self.lifecycle.emit_error(&e.to_string());
                    failures
                }
            };

            self.connection.disconnected(failures);
            self.record_state();
            if self.fail_pending_on_disconnect {
                let failed = self.requests.fail_all(Error::ConnectionClosed);
                if failed > 0 {
                    tracing::debug!(count = failed, "Rejected pending requests after disconnect");
                }
            }
            self.lifecycle.emit_close();
        }
    }

    /// Run one open channel until it closes
    async fn serve(&self, handle: ChannelHandle, reconnected: bool) {
        let ChannelHandle { outbound, mut inbound } = handle;
        *self.outbound.lock() = Some(outbound);
        self.connection.opened();
        self.record_state();

        if reconnected {
            tracing::info!("Reconnected to result server");
            if let Some(ref m) = self.metrics {
                m.record_reconnection_success();
            }
        } else {
            tracing::info!("Connected to result server");
        }
        self.lifecycle.emit_open();

        while let Some(event) = inbound.recv().await {
            match event {
                ChannelEvent::Message(text) => self.handle_message(&text),
                ChannelEvent::Error(message) => {
                    tracing::warn!(error = %message, "Channel error");
                    if let Some(ref m) = self.metrics {
                        m.record_error("channel");
                    }
                    self.lifecycle.emit_error(&message);
                }
                ChannelEvent::Closed => break,
            }
        }

        self.outbound.lock().take();
        tracing::info!("Connection to result server lost");
    }

    /// Classify and route one inbound frame
    fn handle_message(&self, text: &str) {
        let message = match codec::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed message");
                if let Some(ref m) = self.metrics {
                    m.record_error("decode");
                }
                return;
            }
        };

        match message {
            Inbound::Error(message) => {
                tracing::error!(message = %message, "Server reported an error");
                if let Some(ref m) = self.metrics {
                    m.record_error("server");
                }
            }
            Inbound::Api(response) => {
                let tag = response.tag;
                let outcome = if response.resp.success {
                    Ok(response.resp.result)
                } else {
                    Err(Error::Api(response.resp.error_message))
                };
                if !self.requests.complete(tag, outcome) {
                    tracing::warn!(tag, "Response for unknown tag");
                }
            }
            Inbound::Event(event) => {
                if let Some(ref m) = self.metrics {
                    m.record_event(&event.name);
                }
                if self.events.dispatch(&event) == 0 {
                    tracing::debug!(name = %event.name, "Unhandled event");
                }
            }
        }
    }
}
