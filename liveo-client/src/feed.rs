//! Live result snapshot kept in sync with the server
//!
//! A [`ResultsFeed`] is the single writer of the current [`ResultSnapshot`].
//! It listens for two events:
//!
//! - `NewResults`: a full `{Hash, Results}` set, replacing the snapshot wholesale
//! - `NewDelta`: a [`Delta`] reconciled onto the current snapshot
//!
//! Each accepted change publishes a fresh `Arc<ResultSnapshot>` on a watch
//! channel; readers never see a half-applied delta. When a delta does not fit
//! (wrong base hash, positions out of range, or no snapshot loaded yet) the feed
//! asks the server for a full set by sending the raw `RequestResults` message
//! and keeps the snapshot it has until that arrives. Only one request is
//! outstanding at a time: further deltas that do not fit are dropped until a
//! full set arrives or a new channel opens.
//!
//! ```rust,no_run
//! use liveo_client::{ClientBuilder, ResultsFeed};
//!
//! # async fn example() -> liveo_core::Result<()> {
//! let client = ClientBuilder::new("ws://localhost:8080/ws").build()?;
//! let feed = ResultsFeed::attach(&client);
//! client.connect();
//!
//! let mut updates = feed.subscribe();
//! while updates.changed().await.is_ok() {
//!     if let Some(snapshot) = updates.borrow_and_update().clone() {
//!         println!("{}: {} competitors", snapshot.title, snapshot.competitor_count());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::Inner;
use crate::subscription::Subscription;
use crate::{ClientMetrics, LiveoClient};
use liveo_core::{
    reconcile, Delta, RebaseReason, Reconciliation, ResultSnapshot, NEW_DELTA_EVENT, NEW_RESULTS_EVENT,
    REQUEST_RESULTS,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// Event names and control message used by a [`ResultsFeed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    pub results_event: String,
    pub delta_event: String,
    /// Raw message asking the server for a full result set
    pub rebase_message: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            results_event: NEW_RESULTS_EVENT.to_string(),
            delta_event: NEW_DELTA_EVENT.to_string(),
            rebase_message: REQUEST_RESULTS.to_string(),
        }
    }
}

/// Current result snapshot, updated from server events
///
/// Clones share the same state. The feed unregisters its handlers when the
/// last clone is dropped.
#[derive(Clone)]
pub struct ResultsFeed {
    state: Arc<FeedState>,
}

struct FeedState {
    snapshot: watch::Sender<Option<Arc<ResultSnapshot>>>,
    client: Weak<Inner>,
    options: FeedOptions,
    metrics: Option<Arc<ClientMetrics>>,
    applied: AtomicU64,
    rebases: AtomicU64,
    /// A full set was requested and has not arrived yet
    awaiting_full: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ResultsFeed {
    /// Follow `client` using the standard event names
    pub fn attach(client: &LiveoClient) -> Self {
        Self::attach_with(client, FeedOptions::default())
    }

    pub fn attach_with(client: &LiveoClient, options: FeedOptions) -> Self {
        let (snapshot, _) = watch::channel(None);
        let state = Arc::new(FeedState {
            snapshot,
            client: client.downgrade(),
            options,
            metrics: client.inner.metrics.clone(),
            applied: AtomicU64::new(0),
            rebases: AtomicU64::new(0),
            awaiting_full: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&state);
        let on_results = client.on_event(state.options.results_event.clone(), move |data: &Value| {
            if let Some(state) = weak.upgrade() {
                state.replace(data);
            }
        });
        let weak = Arc::downgrade(&state);
        let on_delta = client.on_event(state.options.delta_event.clone(), move |data: &Value| {
            if let Some(state) = weak.upgrade() {
                state.apply(data);
            }
        });
        // A request sent on a channel that has since closed may never be answered.
        let weak = Arc::downgrade(&state);
        let on_open = client.on_open(move || {
            if let Some(state) = weak.upgrade() {
                state.awaiting_full.store(false, Ordering::Release);
            }
        });
        state.subscriptions.lock().extend([on_results, on_delta, on_open]);

        Self { state }
    }

    /// The current snapshot, `None` until the first full result set arrives
    pub fn current(&self) -> Option<Arc<ResultSnapshot>> {
        self.state.snapshot.borrow().clone()
    }

    /// The current snapshot, or the "NOT LOADED" placeholder
    pub fn current_or_placeholder(&self) -> Arc<ResultSnapshot> {
        self.current().unwrap_or_else(|| Arc::new(ResultSnapshot::placeholder()))
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ResultSnapshot>>> {
        self.state.snapshot.subscribe()
    }

    /// Deltas applied so far
    pub fn applied_deltas(&self) -> u64 {
        self.state.applied.load(Ordering::Relaxed)
    }

    /// Full result requests sent because a delta did not fit
    pub fn rebases(&self) -> u64 {
        self.state.rebases.load(Ordering::Relaxed)
    }
}

impl FeedState {
    fn replace(&self, data: &Value) {
        let snapshot: ResultSnapshot = match serde_json::from_value(data.clone()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed full result set");
                return;
            }
        };
        tracing::info!(
            hash = %snapshot.hash,
            courses = snapshot.courses.len(),
            competitors = snapshot.competitor_count(),
            "Full results received"
        );
        self.awaiting_full.store(false, Ordering::Release);
        self.snapshot.send_replace(Some(Arc::new(snapshot)));
    }

    fn apply(&self, data: &Value) {
        let delta: Delta = match serde_json::from_value(data.clone()) {
            Ok(delta) => delta,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed delta");
                return;
            }
        };

        let current = self.snapshot.borrow().clone();
        let Some(current) = current else {
            tracing::debug!(new = %delta.new, "Delta before any full result set");
            self.rebase("not_loaded");
            return;
        };

        match reconcile(&current, &delta) {
            Reconciliation::Applied(next) => {
                tracing::debug!(old = %delta.old, new = %delta.new, "Delta applied");
                self.applied.fetch_add(1, Ordering::Relaxed);
                if let Some(ref m) = self.metrics {
                    m.record_delta_applied();
                }
                self.snapshot.send_replace(Some(Arc::new(next)));
            }
            Reconciliation::RebaseRequired(reason) => {
                tracing::debug!(reason = %reason, "Delta does not apply, requesting full results");
                self.rebase(match reason {
                    RebaseReason::HashMismatch { .. } => "hash_mismatch",
                    RebaseReason::MalformedPatch(_) => "malformed_patch",
                });
            }
        }
    }

    fn rebase(&self, reason: &str) {
        if self.awaiting_full.swap(true, Ordering::AcqRel) {
            tracing::debug!(reason, "Full results already requested");
            return;
        }
        self.rebases.fetch_add(1, Ordering::Relaxed);
        if let Some(ref m) = self.metrics {
            m.record_rebase(reason);
        }
        let sent = match LiveoClient::upgrade(&self.client) {
            Some(client) => client.send_raw(self.options.rebase_message.as_str()),
            None => Err(liveo_core::Error::NotConnected),
        };
        if let Err(e) = sent {
            tracing::debug!(error = %e, "Could not request full results");
            self.awaiting_full.store(false, Ordering::Release);
        }
    }
}
