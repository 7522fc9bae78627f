//! Request tracking for API calls
//!
//! Every API request gets a tag from a per-transport counter and a oneshot
//! channel registered under that tag. The receive loop completes the entry when
//! a response with the same tag arrives.
//!
//! # Request Lifecycle
//!
//! 1. **Allocate**: take the next tag (starting at 1, never reused)
//! 2. **Register**: park a oneshot sender under the tag
//! 3. **Send**: write the envelope; if that fails, reject the entry at once
//! 4. **Complete**: the matching response removes the entry and settles it
//!
//! Removal and settlement happen under one lock, so a tag is settled at most
//! once even if a duplicate response arrives.

use liveo_core::{Error, Result, Tag};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type Settle = oneshot::Sender<Result<Value>>;

/// Table of pending API requests
#[derive(Clone)]
pub struct RequestManager {
    pending: Arc<Mutex<HashMap<Tag, Settle>>>,
    counter: Arc<AtomicU64>,
}

impl RequestManager {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Allocate the next tag
    pub fn next_tag(&self) -> Tag {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Register a pending request under `tag`
    pub fn register(&self, tag: Tag) -> oneshot::Receiver<Result<Value>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(tag, tx);
        rx
    }

    /// Settle the request registered under `tag`
    ///
    /// Returns `false` when no such request is pending.
    pub fn complete(&self, tag: Tag, result: Result<Value>) -> bool {
        match self.pending.lock().remove(&tag) {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    /// Reject the request registered under `tag`
    pub fn fail(&self, tag: Tag, error: Error) -> bool {
        self.complete(tag, Err(error))
    }

    /// Reject every pending request, returning how many there were
    pub fn fail_all(&self, error: Error) -> usize {
        let drained: Vec<Settle> = self.pending.lock().drain().map(|(_, tx)| tx).collect();
        let count = drained.len();
        for tx in drained {
            let _ = tx.send(Err(error.clone()));
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}

/// An API request that has already been sent (or already failed)
///
/// Returned immediately by `LiveoClient::send_api_request`; await it for the
/// `Result` payload. Dropping it does not cancel anything on the server.
#[must_use = "an ApiCall does nothing useful unless awaited"]
pub struct ApiCall {
    tag: Tag,
    state: CallState,
}

enum CallState {
    Pending(oneshot::Receiver<Result<Value>>),
    Failed(Option<Error>),
}

impl ApiCall {
    pub(crate) fn pending(tag: Tag, rx: oneshot::Receiver<Result<Value>>) -> Self {
        Self {
            tag,
            state: CallState::Pending(rx),
        }
    }

    pub(crate) fn failed(tag: Tag, error: Error) -> Self {
        Self {
            tag,
            state: CallState::Failed(Some(error)),
        }
    }

    /// Tag the request was sent with
    pub fn tag(&self) -> Tag {
        self.tag
    }
}

impl Future for ApiCall {
    type Output = Result<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            CallState::Pending(rx) => Pin::new(rx).poll(cx).map(|settled| {
                settled.unwrap_or_else(|_| Err(Error::Internal("Request channel closed".to_string())))
            }),
            CallState::Failed(error) => Poll::Ready(Err(error
                .take()
                .unwrap_or_else(|| Error::Internal("ApiCall polled after completion".to_string())))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags_start_at_one_and_increase() {
        let manager = RequestManager::new();
        assert_eq!(manager.next_tag(), 1);
        assert_eq!(manager.next_tag(), 2);
        assert_eq!(manager.clone().next_tag(), 3);
    }

    #[tokio::test]
    async fn test_register_and_complete() {
        let manager = RequestManager::new();
        let tag = manager.next_tag();

        let rx = manager.register(tag);
        assert_eq!(manager.pending_count(), 1);

        assert!(manager.complete(tag, Ok(json!(42))));
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(rx.await.unwrap().unwrap(), json!(42));
    }

    #[tokio::test]
    async fn test_second_completion_is_ignored() {
        let manager = RequestManager::new();
        let rx = manager.register(1);

        assert!(manager.complete(1, Ok(json!("first"))));
        assert!(!manager.complete(1, Ok(json!("second"))));
        assert_eq!(rx.await.unwrap().unwrap(), json!("first"));
    }

    #[tokio::test]
    async fn test_unknown_tag_leaves_others_alone() {
        let manager = RequestManager::new();
        let rx = manager.register(1);

        assert!(!manager.complete(99, Ok(json!(null))));
        assert_eq!(manager.pending_count(), 1);
        assert!(manager.complete(1, Ok(json!("mine"))));
        assert_eq!(rx.await.unwrap().unwrap(), json!("mine"));
    }

    #[tokio::test]
    async fn test_fail_request() {
        let manager = RequestManager::new();
        let rx = manager.register(1);

        assert!(manager.fail(1, Error::Api("denied".to_string())));
        assert_eq!(rx.await.unwrap().unwrap_err(), Error::Api("denied".to_string()));
    }

    #[tokio::test]
    async fn test_fail_all() {
        let manager = RequestManager::new();
        let rx1 = manager.register(1);
        let rx2 = manager.register(2);

        assert_eq!(manager.fail_all(Error::ConnectionClosed), 2);
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(rx1.await.unwrap().unwrap_err(), Error::ConnectionClosed);
        assert_eq!(rx2.await.unwrap().unwrap_err(), Error::ConnectionClosed);
    }

    #[tokio::test]
    async fn test_api_call_resolves() {
        let manager = RequestManager::new();
        let call = ApiCall::pending(5, manager.register(5));
        assert_eq!(call.tag(), 5);

        manager.complete(5, Ok(json!({"ok": true})));
        assert_eq!(call.await.unwrap(), json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_failed_api_call_rejects_immediately() {
        let call = ApiCall::failed(3, Error::NotConnected);
        assert_eq!(call.await.unwrap_err(), Error::NotConnected);
    }

    #[tokio::test]
    async fn test_api_call_after_manager_drop() {
        let manager = RequestManager::new();
        let call = ApiCall::pending(1, manager.register(1));
        drop(manager);
        assert!(matches!(call.await.unwrap_err(), Error::Internal(_)));
    }
}
