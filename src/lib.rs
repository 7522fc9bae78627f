//! liveo - live race results over a reconnecting WebSocket
//!
//! This is the convenience crate that re-exports both liveo sub-crates.
//!
//! # Architecture
//!
//! - **liveo-core**: result model, wire envelope codec, IndexPatch and snapshot
//!   reconciliation, delta generation, error handling, observability
//! - **liveo-client**: reconnecting transport, API correlation, event dispatch,
//!   results feed and connection status
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use liveo::{ClientBuilder, ResultsFeed};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("ws://localhost:8080/ws").build()?;
//!     let feed = ResultsFeed::attach(&client);
//!     client.connect();
//!
//!     let mut updates = feed.subscribe();
//!     while updates.changed().await.is_ok() {
//!         if let Some(snapshot) = updates.borrow_and_update().clone() {
//!             println!("{} ({})", snapshot.title, snapshot.hash);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Reconciling Without A Client
//!
//! ```rust
//! use liveo::core::{reconcile, Course, Delta, IndexPatch, ResultSnapshot};
//!
//! let current = ResultSnapshot::new(1, "Day 1", vec![Course::new("Brown")]);
//! let delta = Delta::new(1, 2).with_courses(IndexPatch::new().add(1, Course::new("Blue")));
//!
//! let next = reconcile(&current, &delta).into_snapshot().unwrap();
//! assert_eq!(next.courses.len(), 2);
//! assert_eq!(current.courses.len(), 1);
//! ```

pub use liveo_client as client;
pub use liveo_core as core;

pub use liveo_client::{ClientBuilder, LiveoClient, ResultsFeed, StatusIndicator, Subscription};
pub use liveo_core::{reconcile, Delta, Error, Reconciliation, Result, ResultSnapshot};
