//! Event dispatch
//!
//! Server-pushed events are `{Name, Data}` pairs. The dispatcher fans each one
//! out to every live handler registered for that name, in registration order.
//! Names nobody listens to are normal: the server broadcasts more than any one
//! client consumes.
//!
//! Handlers are plain synchronous closures. They run on the receive loop, so
//! anything slow should be handed to a task of its own.
//!
//! # Examples
//!
//! ```rust
//! use liveo_client::EventDispatcher;
//! use liveo_core::EventMessage;
//! use serde_json::json;
//!
//! let dispatcher = EventDispatcher::new();
//! let sub = dispatcher.register("NewResults", |data| println!("full results: {}", data));
//!
//! assert_eq!(dispatcher.dispatch(&EventMessage::new("NewResults", json!({"Hash": 1}))), 1);
//! sub.dispose();
//! assert_eq!(dispatcher.dispatch(&EventMessage::new("NewResults", json!({"Hash": 2}))), 0);
//! ```

use crate::subscription::{HandlerList, Subscription};
use liveo_core::EventMessage;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Event handler signature
pub type EventFn = dyn Fn(&Value) + Send + Sync;

type SignalFn = dyn Fn() + Send + Sync;
type ErrorFn = dyn Fn(&str) + Send + Sync;

/// Registry of named event handlers
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Arc<Mutex<HashMap<String, HandlerList<EventFn>>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events called `name`
    pub fn register<F>(&self, name: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let list = self.handlers.lock().entry(name.into()).or_default().clone();
        list.push(Arc::new(handler))
    }

    /// Deliver `event` to its live handlers, returning how many ran
    pub fn dispatch(&self, event: &EventMessage) -> usize {
        let list = self.handlers.lock().get(&event.name).cloned();
        match list {
            Some(list) => list.emit(|handler| handler(&event.data)),
            None => 0,
        }
    }

    /// Whether any live handler listens for `name`
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.lock().get(name).map_or(false, |list| list.len() > 0)
    }
}

/// Open, close and error listeners of one transport
#[derive(Clone, Default)]
pub(crate) struct LifecycleListeners {
    open: HandlerList<SignalFn>,
    close: HandlerList<SignalFn>,
    error: HandlerList<ErrorFn>,
}

impl LifecycleListeners {
    pub(crate) fn on_open(&self, handler: Arc<SignalFn>) -> Subscription {
        self.open.push(handler)
    }

    pub(crate) fn on_close(&self, handler: Arc<SignalFn>) -> Subscription {
        self.close.push(handler)
    }

    pub(crate) fn on_error(&self, handler: Arc<ErrorFn>) -> Subscription {
        self.error.push(handler)
    }

    pub(crate) fn emit_open(&self) {
        self.open.emit(|handler| handler());
    }

    pub(crate) fn emit_close(&self) {
        self.close.emit(|handler| handler());
    }

    pub(crate) fn emit_error(&self, message: &str) {
        self.error.emit(|handler| handler(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_by_name() {
        let dispatcher = EventDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let _sub = dispatcher.register("NewDelta", move |data: &Value| seen_clone.lock().push(data.clone()));

        assert_eq!(dispatcher.dispatch(&EventMessage::new("NewDelta", json!({"Old": 1}))), 1);
        assert_eq!(dispatcher.dispatch(&EventMessage::new("Unrelated", json!(null))), 0);
        assert_eq!(*seen.lock(), vec![json!({"Old": 1})]);
    }

    #[test]
    fn test_has_handler_tracks_release() {
        let dispatcher = EventDispatcher::new();
        let sub = dispatcher.register("NewResults", |_: &Value| {});
        assert!(dispatcher.has_handler("NewResults"));

        sub.dispose();
        assert!(!dispatcher.has_handler("NewResults"));
    }

    #[test]
    fn test_multiple_handlers_same_name() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                dispatcher.register("NewDelta", move |_: &Value| order.lock().push(i))
            })
            .collect();

        dispatcher.dispatch(&EventMessage::new("NewDelta", Value::Null));
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn test_lifecycle_listeners() {
        let listeners = LifecycleListeners::default();
        let opens = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let opens_clone = Arc::clone(&opens);
        let open_sub = listeners.on_open(Arc::new(move || {
            opens_clone.fetch_add(1, Ordering::SeqCst);
        }));
        let errors_clone = Arc::clone(&errors);
        let _error_sub = listeners.on_error(Arc::new(move |msg: &str| errors_clone.lock().push(msg.to_string())));

        listeners.emit_open();
        listeners.emit_error("connection refused");
        open_sub.dispose();
        listeners.emit_open();
        listeners.emit_close();

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(*errors.lock(), vec!["connection refused".to_string()]);
    }
}
