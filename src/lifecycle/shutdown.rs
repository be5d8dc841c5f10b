//! Shutdown coordination for the server.

use tokio::sync::{broadcast, watch};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Server lifecycle: Running → Draining → Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting connections.
    Running,
    /// No longer accepting; in-flight requests finishing within the grace period.
    Draining,
    /// All work drained or forcibly terminated.
    Stopped,
}

/// Observable lifecycle state. Transitions only move forward.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Running);
        Self { tx }
    }

    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    /// Watch for transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `next` if it is later than the current state.
    pub fn advance(&self, next: LifecycleState) {
        self.tx.send_if_modified(|current| {
            if rank(next) > rank(*current) {
                tracing::info!(from = ?*current, to = ?next, "Lifecycle transition");
                *current = next;
                true
            } else {
                false
            }
        });
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

fn rank(state: LifecycleState) -> u8 {
    match state {
        LifecycleState::Running => 0,
        LifecycleState::Draining => 1,
        LifecycleState::Stopped => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_only_moves_forward() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Running);

        lifecycle.advance(LifecycleState::Draining);
        assert_eq!(lifecycle.state(), LifecycleState::Draining);

        lifecycle.advance(LifecycleState::Running);
        assert_eq!(lifecycle.state(), LifecycleState::Draining);

        lifecycle.advance(LifecycleState::Stopped);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let lifecycle = Lifecycle::new();
        let mut rx = lifecycle.subscribe();
        lifecycle.advance(LifecycleState::Stopped);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn shutdown_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);
        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }
}
