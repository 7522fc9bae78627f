//! Channel adapter
//!
//! The transport sees a connection only through four signals: open, message,
//! error and close. A [`Connector`] produces one [`ChannelHandle`] per
//! connection attempt; a successful [`Connector::open`] is the open signal and
//! the remaining three arrive as [`ChannelEvent`]s on the handle's inbound
//! receiver. Outbound text is best effort: it is queued on an unbounded sender
//! and silently lost if the connection is already gone.
//!
//! [`WsConnector`] implements the adapter over `tokio-tungstenite`. Tests plug
//! in their own connector to script a server without a socket.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use liveo_core::{Error, Result};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Signal delivered by an open channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A text frame
    Message(String),
    /// A transport-level error; a `Closed` normally follows
    Error(String),
    /// The channel is gone; nothing else will arrive
    Closed,
}

/// One open duplex connection
#[derive(Debug)]
pub struct ChannelHandle {
    /// Text frames to send
    pub outbound: mpsc::UnboundedSender<String>,
    /// Messages, errors and the final close
    pub inbound: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl ChannelHandle {
    /// Create a handle together with the far ends of both queues
    ///
    /// The returned receiver yields what the transport sends; the sender feeds
    /// events to it. Useful for in-process connectors.
    pub fn pair() -> (
        Self,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedSender<ChannelEvent>,
    ) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        (Self { outbound, inbound }, outbound_rx, inbound_tx)
    }
}

/// Opens connections for the transport
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new channel
    ///
    /// Called again after every close or failure. Returning `Ok` counts as the
    /// open signal.
    async fn open(&self) -> Result<ChannelHandle>;
}

/// WebSocket connector
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self) -> Result<ChannelHandle> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        let (mut sink, mut stream) = ws_stream.split();
        let (handle, mut outbound_rx, inbound_tx) = ChannelHandle::pair();

        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::debug!(error = %e, "Dropping outbound frame, socket closed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let event = match frame {
                    Ok(Message::Text(text)) => ChannelEvent::Message(text),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => ChannelEvent::Message(text),
                        Err(_) => {
                            tracing::warn!("Ignoring non UTF-8 binary frame");
                            continue;
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = inbound_tx.send(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                };
                if inbound_tx.send(event).is_err() {
                    return;
                }
            }
            let _ = inbound_tx.send(ChannelEvent::Closed);
        });

        Ok(handle)
    }
}
