//! Live race-results client over a reconnecting WebSocket
//!
//! This crate keeps a long-lived connection to a result server and turns its
//! traffic into an always-current [`ResultSnapshot`](liveo_core::ResultSnapshot).
//!
//! # Core Features
//!
//! - **Reconnecting Transport**: retries forever on a stepped schedule
//!   (0 ms, 100 ms, 1 s, 3 s, then 5 s between attempts)
//! - **API Calls**: tagged request/response pairs, each settled exactly once
//! - **Events**: named server pushes fanned out to scoped subscriptions
//! - **Results Feed**: full result sets and deltas reconciled into immutable snapshots
//! - **Status**: connected / pending / disconnected with a start-up grace period
//! - **Observability**: OpenTelemetry integration for traces and metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use liveo_client::{ClientBuilder, ResultsFeed};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("ws://localhost:8080/ws").build()?;
//!     let feed = ResultsFeed::attach(&client);
//!
//!     let _opened = client.on_open(|| println!("connected"));
//!     client.connect();
//!
//!     // Typed API call
//!     let courses: Vec<String> = client.request("GetCourses", ()).await?;
//!     println!("{} courses, {:?} loaded", courses.len(), feed.current().map(|s| s.hash));
//!     Ok(())
//! }
//! ```

mod channel;
mod client;
mod client_builder;
mod connection_state;
mod events;
mod feed;
mod metrics;
mod preferences;
mod reconnect;
mod request;
mod status;
mod subscription;

pub use channel::{ChannelEvent, ChannelHandle, Connector, WsConnector};
pub use client::LiveoClient;
pub use client_builder::ClientBuilder;
pub use connection_state::{ConnectionManager, ConnectionState};
pub use events::{EventDispatcher, EventFn};
pub use feed::{FeedOptions, ResultsFeed};
pub use metrics::ClientMetrics;
pub use preferences::{MemoryPreferences, PreferenceStore};
pub use reconnect::{FixedDelay, ReconnectionStrategy, SteppedBackoff};
pub use request::{ApiCall, RequestManager};
pub use status::{ConnectionStatus, StatusIndicator, DEFAULT_GRACE};
pub use subscription::Subscription;
