//! Shutdown signaling for batch delivery runs.
//!
//! The delivery queue counts every accepted payload as outstanding work.
//! When the count drains to zero the coordinator publishes a single
//! cancellation signal; the membership listener consumes it and stops its
//! run loop. The counter itself lives with the rest of the shared queue
//! state; this type only owns the signal and the fired-once guarantee.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// Publishes the one-shot "all work done" signal consumed by run loops
#[derive(Debug)]
pub struct ShutdownCoordinator {
    signal: broadcast::Sender<()>,
    fired: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (signal, _) = broadcast::channel(1);
        Self {
            signal,
            fired: AtomicBool::new(false),
        }
    }

    /// Receiver side for a run loop.
    ///
    /// Subscribe before dispatching the batch: a signal fired earlier is
    /// only observable through [`ShutdownCoordinator::triggered`].
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.signal.subscribe()
    }

    /// Whether the signal has already fired
    pub fn triggered(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Fire the shutdown signal.
    ///
    /// Reaching zero outstanding work is terminal, so firing twice means
    /// the caller's accounting is broken; that is a panic, not a log line.
    pub fn trigger(&self) {
        let already_fired = self.fired.swap(true, Ordering::SeqCst);
        assert!(!already_fired, "shutdown signal fired twice");

        // No receivers is fine: a loop that subscribes later sees the
        // fired flag through triggered().
        let _ = self.signal.send(());

        tracing::info!("All outstanding sends completed, signaling shutdown");
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
