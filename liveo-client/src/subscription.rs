//! Scoped handler registrations
//!
//! Every `on_*` registration returns a [`Subscription`]. The handler stays
//! registered while the subscription is alive and is released when it is
//! disposed or dropped. Release is permanent and takes effect immediately:
//! a dispatch that already took its snapshot of the handler list still checks
//! each slot's flag right before calling it, so a released handler never runs
//! again.
//!
//! Each slot has a reentrant gate held across the flag check and the call.
//! Releasing a subscription takes the same gate, so when another thread is
//! running the handler, `dispose()` returns only after that call finishes.
//! A handler may release its own subscription (or any other one on the same
//! thread) without blocking. Two handlers running on different threads must
//! not wait on each other's release.
//!
//! ```rust,no_run
//! # async fn example(client: &liveo_client::LiveoClient) {
//! let sub = client.on_event("NewResults", |data| println!("{}", data));
//! // ... later, when the owning view goes away:
//! sub.dispose();
//!
//! // Handlers meant to live as long as the client:
//! client.on_open(|| println!("connected")).detach();
//! # }
//! ```

use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle that keeps one handler registered
#[must_use = "dropping a Subscription unregisters its handler; call detach() to keep it"]
pub struct Subscription {
    slot: Option<Arc<SlotState>>,
}

/// Registration state shared by a slot and its subscription
struct SlotState {
    live: AtomicBool,
    gate: ReentrantMutex<()>,
}

impl SlotState {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn release(&self) {
        let _gate = self.gate.lock();
        self.live.store(false, Ordering::Release);
    }
}

impl Subscription {
    fn new(slot: Arc<SlotState>) -> Self {
        Self { slot: Some(slot) }
    }

    /// Unregister the handler
    pub fn dispose(self) {
        drop(self);
    }

    /// Keep the handler registered for the lifetime of the client
    pub fn detach(mut self) {
        self.slot = None;
    }

    /// Whether the handler is still registered
    pub fn is_active(&self) -> bool {
        self.slot.as_ref().map_or(false, |slot| slot.is_live())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .field("detached", &self.slot.is_none())
            .finish()
    }
}

struct Slot<F: ?Sized> {
    state: Arc<SlotState>,
    handler: Arc<F>,
}

impl<F: ?Sized> Clone for Slot<F> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<F: ?Sized> Slot<F> {
    fn is_live(&self) -> bool {
        self.state.is_live()
    }
}

/// Ordered list of handlers sharing one signal
pub(crate) struct HandlerList<F: ?Sized> {
    slots: Arc<Mutex<Vec<Slot<F>>>>,
}

impl<F: ?Sized> Clone for HandlerList<F> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<F: ?Sized> Default for HandlerList<F> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<F: ?Sized> HandlerList<F> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a handler; it fires after every handler registered before it
    pub(crate) fn push(&self, handler: Arc<F>) -> Subscription {
        let state = Arc::new(SlotState {
            live: AtomicBool::new(true),
            gate: ReentrantMutex::new(()),
        });
        let mut slots = self.slots.lock();
        slots.retain(Slot::is_live);
        slots.push(Slot {
            state: Arc::clone(&state),
            handler,
        });
        Subscription::new(state)
    }

    /// Call `invoke` for every live handler in registration order
    ///
    /// The list lock is not held while handlers run, so a handler may register
    /// or release subscriptions. Returns the number of handlers called.
    pub(crate) fn emit(&self, mut invoke: impl FnMut(&F)) -> usize {
        let snapshot: Vec<Slot<F>> = {
            let mut slots = self.slots.lock();
            slots.retain(Slot::is_live);
            slots.clone()
        };

        let mut called = 0;
        for slot in snapshot {
            let _gate = slot.state.gate.lock();
            if slot.is_live() {
                invoke(slot.handler.as_ref());
                called += 1;
            }
        }
        called
    }

    /// Number of live handlers
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().iter().filter(|slot| slot.is_live()).count()
    }
}
