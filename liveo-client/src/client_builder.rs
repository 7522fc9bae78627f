//! Client builder
//!
//! The `ClientBuilder` collects everything a [`LiveoClient`] needs before the
//! first connection attempt:
//! - where to connect (a WebSocket URL or any custom [`Connector`])
//! - the reconnection schedule
//! - what happens to pending API calls when the channel drops
//! - OpenTelemetry observability
//!
//! # Examples
//!
//! ```rust,no_run
//! use liveo_client::{ClientBuilder, FixedDelay};
//! use std::time::Duration;
//!
//! # async fn example() -> liveo_core::Result<()> {
//! // Default stepped schedule
//! let client = ClientBuilder::new("ws://localhost:8080/ws").connect()?;
//!
//! // Custom schedule, pending calls left open across drops
//! let client2 = ClientBuilder::new("ws://localhost:8080/ws")
//!     .with_reconnect(Box::new(FixedDelay::new(Duration::from_secs(2))))
//!     .fail_pending_on_disconnect(false)
//!     .connect()?;
//! # Ok(())
//! # }
//! ```

use crate::channel::{Connector, WsConnector};
use crate::connection_state::ConnectionManager;
use crate::reconnect::{ReconnectionStrategy, SteppedBackoff};
use crate::{ClientMetrics, LiveoClient};
use liveo_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;

/// Builder for configuring and creating a [`LiveoClient`]
pub struct ClientBuilder {
    connector: Arc<dyn Connector>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    fail_pending_on_disconnect: bool,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Builder for a WebSocket connection to `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_connector(WsConnector::new(url))
    }

    /// Builder for an arbitrary channel
    pub fn with_connector(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            reconnect_strategy: None,
            fail_pending_on_disconnect: true,
            observability_config: None,
            service_name: None,
        }
    }

    /// Replace the default stepped reconnection schedule
    pub fn with_reconnect(mut self, strategy: Box<dyn ReconnectionStrategy>) -> Self {
        self.reconnect_strategy = Some(strategy);
        self
    }

    /// Reject pending API calls with `ConnectionClosed` when the channel drops
    ///
    /// On by default. When off, calls sent before a drop stay pending until a
    /// response with their tag arrives, which after a reconnect usually never
    /// happens.
    pub fn fail_pending_on_disconnect(mut self, enabled: bool) -> Self {
        self.fail_pending_on_disconnect = enabled;
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Create the client without connecting
    ///
    /// # Errors
    ///
    /// Fails only when observability is enabled and cannot be initialized.
    pub fn build(self) -> Result<LiveoClient> {
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            liveo_core::init_observability(config.clone())
                .map_err(|e| Error::Internal(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(ClientMetrics::new(config.service_name)))
        } else {
            None
        };

        let strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(SteppedBackoff::default()));

        Ok(LiveoClient::from_parts(
            self.connector,
            ConnectionManager::new(strategy),
            self.fail_pending_on_disconnect,
            metrics,
        ))
    }

    /// Create the client and start connecting in the background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(self) -> Result<LiveoClient> {
        let client = self.build()?;
        client.connect();
        Ok(client)
    }
}
