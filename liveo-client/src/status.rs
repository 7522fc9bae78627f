//! Connection status for display
//!
//! A freshly started client is not connected yet, and a reconnect after a
//! drop usually takes a few hundred milliseconds. Showing "disconnected"
//! during either makes the indicator flicker, so [`StatusIndicator`] reports
//! [`ConnectionStatus::Pending`] until a grace period measured from its
//! creation has passed.

use crate::connection_state::ConnectionState;
use crate::LiveoClient;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Default grace period before a negative status is shown
pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

/// What a status indicator should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    /// Not connected, still within the grace period
    Pending,
    Disconnected,
}

/// Connection status with a start-up grace period
pub struct StatusIndicator {
    state: watch::Receiver<ConnectionState>,
    created: Instant,
    grace: Duration,
    /// Last status returned by `changed`
    reported: ConnectionStatus,
}

impl StatusIndicator {
    /// Indicator for `client` with the default grace period
    pub fn new(client: &LiveoClient) -> Self {
        Self::with_grace(client.watch_state(), DEFAULT_GRACE)
    }

    pub fn with_grace(mut state: watch::Receiver<ConnectionState>, grace: Duration) -> Self {
        let created = Instant::now();
        let reported = Self::classify(*state.borrow_and_update(), created, grace, created);
        Self {
            state,
            created,
            grace,
            reported,
        }
    }

    fn classify(state: ConnectionState, created: Instant, grace: Duration, now: Instant) -> ConnectionStatus {
        if state.is_open() {
            ConnectionStatus::Connected
        } else if now.saturating_duration_since(created) < grace {
            ConnectionStatus::Pending
        } else {
            ConnectionStatus::Disconnected
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status_at(Instant::now())
    }

    /// Status as it would be shown at `now`
    pub fn status_at(&self, now: Instant) -> ConnectionStatus {
        Self::classify(*self.state.borrow(), self.created, self.grace, now)
    }

    /// Wait until the status differs from the one last returned here
    ///
    /// A change that happened since the previous call is returned right away.
    /// Cancel safe: dropping the future loses no transition. Returns `None`
    /// once the client is gone.
    pub async fn changed(&mut self) -> Option<ConnectionStatus> {
        loop {
            let state = *self.state.borrow_and_update();
            let current = Self::classify(state, self.created, self.grace, Instant::now());
            if current != self.reported {
                self.reported = current;
                return Some(current);
            }

            let grace_end = self.created + self.grace;
            let waiting_on_grace = current == ConnectionStatus::Pending;
            tokio::select! {
                changed = self.state.changed() => {
                    changed.ok()?;
                }
                _ = tokio::time::sleep_until(grace_end), if waiting_on_grace => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(grace: Duration) -> (watch::Sender<ConnectionState>, StatusIndicator) {
        let (tx, rx) = watch::channel(ConnectionState::default());
        (tx, StatusIndicator::with_grace(rx, grace))
    }

    #[test]
    fn test_pending_within_grace() {
        let (_tx, status) = indicator(DEFAULT_GRACE);
        let start = status.created;
        assert_eq!(status.status_at(start), ConnectionStatus::Pending);
        assert_eq!(status.status_at(start + Duration::from_millis(499)), ConnectionStatus::Pending);
        assert_eq!(status.status_at(start + Duration::from_millis(500)), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_connected_regardless_of_grace() {
        let (tx, status) = indicator(DEFAULT_GRACE);
        tx.send_replace(ConnectionState::Open);
        assert_eq!(status.status_at(status.created), ConnectionStatus::Connected);

        tx.send_replace(ConnectionState::Disconnected { attempt: 1 });
        let later = status.created + Duration::from_secs(5);
        assert_eq!(status.status_at(later), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_fires_when_grace_expires() {
        let (_tx, mut status) = indicator(DEFAULT_GRACE);
        assert_eq!(status.status(), ConnectionStatus::Pending);
        assert_eq!(status.changed().await, Some(ConnectionStatus::Disconnected));
    }

    #[tokio::test]
    async fn test_change_before_first_call_is_reported() {
        let (tx, mut status) = indicator(DEFAULT_GRACE);
        tx.send_replace(ConnectionState::Open);
        assert_eq!(status.changed().await, Some(ConnectionStatus::Connected));
    }

    #[tokio::test]
    async fn test_change_between_calls_is_reported() {
        let (tx, mut status) = indicator(Duration::ZERO);
        tx.send_replace(ConnectionState::Open);
        assert_eq!(status.changed().await, Some(ConnectionStatus::Connected));

        // Both transitions land before the next call; only the net result counts.
        tx.send_replace(ConnectionState::Connecting);
        tx.send_replace(ConnectionState::Disconnected { attempt: 1 });
        assert_eq!(status.changed().await, Some(ConnectionStatus::Disconnected));

        tx.send_replace(ConnectionState::Open);
        assert_eq!(status.changed().await, Some(ConnectionStatus::Connected));
    }

    #[tokio::test]
    async fn test_cancelled_wait_keeps_transition() {
        let (tx, mut status) = indicator(Duration::ZERO);
        let waited = tokio::time::timeout(Duration::from_millis(10), status.changed()).await;
        assert!(waited.is_err());

        tx.send_replace(ConnectionState::Open);
        assert_eq!(status.changed().await, Some(ConnectionStatus::Connected));
    }

    #[tokio::test]
    async fn test_changed_follows_connection() {
        let (tx, mut status) = indicator(Duration::ZERO);
        tx.send_replace(ConnectionState::Open);
        assert_eq!(status.changed().await, Some(ConnectionStatus::Connected));

        drop(tx);
        assert_eq!(status.changed().await, None);
    }
}
