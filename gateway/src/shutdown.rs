//! Shutdown signalling
//!
//! A single owner fires the signal once; any number of observers check it
//! between steps or await it inside `tokio::select!`.
//!
//! ```ignore
//! let shutdown = Shutdown::new();
//! let mut signal = shutdown.signal();
//!
//! tokio::spawn(async move {
//!     tokio::select! {
//!         _ = signal.triggered() => {}
//!         _ = do_work() => {}
//!     }
//! });
//!
//! shutdown.trigger();
//! ```

use tokio::sync::watch;

/// Owning side of the shutdown signal
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create an untriggered signal
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Fire the signal. Later calls have no further effect.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`Shutdown::trigger`] has been called
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new observer of this signal
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side of the shutdown signal
///
/// Dropping the owning [`Shutdown`] counts as triggering.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested
    pub async fn triggered(&mut self) {
        // Err means the owner is gone, which is shutdown too
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_signal_is_untriggered() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(!shutdown.signal().is_triggered());
    }

    #[test]
    fn test_trigger_is_seen_by_all_observers() {
        let shutdown = Shutdown::new();
        let a = shutdown.signal();
        let b = a.clone();

        shutdown.trigger();
        shutdown.trigger();

        assert!(shutdown.is_triggered());
        assert!(a.is_triggered());
        assert!(b.is_triggered());
        // observers created after the fact see it too
        assert!(shutdown.signal().is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_wakes_waiter() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();

        let waiter = tokio::spawn(async move {
            signal.triggered().await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .expect("waiter should not panic");
    }

    #[tokio::test]
    async fn test_dropping_owner_counts_as_trigger() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        drop(shutdown);

        assert!(signal.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), signal.triggered())
            .await
            .expect("dropped owner should release waiters");
    }
}
