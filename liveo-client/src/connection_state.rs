//! Connection state management
//!
//! The transport cycles forever through three states:
//!
//! ```text
//! Disconnected{0} → Connecting → Open → Disconnected{1} → Connecting → ...
//!                       ↓
//!                 Disconnected{n+1}   (attempt failed)
//! ```
//!
//! `attempt` counts consecutive failures and picks the next delay from the
//! [`ReconnectionStrategy`]. A successful open resets it to 0, so the next drop
//! publishes `Disconnected{1}` and reconnects after the first step's delay.
//!
//! The current state is published through a `tokio::sync::watch` channel so
//! that observers (status indicators, tests) can await transitions instead of
//! polling.

use crate::reconnect::ReconnectionStrategy;
use std::time::Duration;
use tokio::sync::watch;

/// Transport connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting before the next attempt; `attempt` consecutive attempts have failed
    Disconnected { attempt: u32 },
    /// A connect attempt is in flight
    Connecting,
    /// The channel is open and frames flow
    Open,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Numeric value recorded by the connection state gauge
    pub(crate) fn gauge_value(&self) -> i64 {
        match self {
            ConnectionState::Disconnected { .. } => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Open => 2,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected { attempt: 0 }
    }
}

/// Tracks the connection state and the consecutive failure count
pub struct ConnectionManager {
    state: watch::Sender<ConnectionState>,
    strategy: Box<dyn ReconnectionStrategy>,
}

impl ConnectionManager {
    pub fn new(strategy: Box<dyn ReconnectionStrategy>) -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        Self { state, strategy }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Consecutive failures so far (0 while connecting or open)
    pub fn failures(&self) -> u32 {
        match self.state() {
            ConnectionState::Disconnected { attempt } => attempt,
            _ => 0,
        }
    }

    /// Delay to wait before the next attempt
    pub fn next_delay(&self) -> Duration {
        self.strategy.next_delay(self.failures())
    }

    /// Transition to `Connecting`, returning the failure count that led here
    pub fn connecting(&self) -> u32 {
        let failures = self.failures();
        self.state.send_replace(ConnectionState::Connecting);
        failures
    }

    /// Transition to `Open`
    pub fn opened(&self) {
        self.state.send_replace(ConnectionState::Open);
    }

    /// Record a closed channel or failed attempt
    ///
    /// `failures_before` is the count returned by [`connecting`](Self::connecting);
    /// it is 0 again when the attempt reached `Open`.
    pub fn disconnected(&self, failures_before: u32) -> ConnectionState {
        let next = ConnectionState::Disconnected {
            attempt: failures_before.saturating_add(1),
        };
        self.state.send_replace(next);
        next
    }

    /// Leave `Open` or `Connecting` without counting a failure
    pub fn stopped(&self) {
        let attempt = self.failures();
        self.state.send_replace(ConnectionState::Disconnected { attempt });
    }
}
