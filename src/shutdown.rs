//! Cooperative cancellation shared by every harness task.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

/// Creates the sending half and a first listener.
pub fn channel() -> (watch::Sender<bool>, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (tx, Shutdown::new(rx))
}

/// Listener side of the shutdown broadcast.
///
/// A dropped sender counts as a shutdown request.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested.
    pub async fn triggered(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    /// Sleep for `duration`. Returns `false` if shutdown came first.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        self.run(tokio::time::sleep(duration)).await.is_some()
    }

    /// Drive `fut` to completion unless shutdown is requested first.
    pub async fn run<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        if self.is_triggered() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.triggered() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_completes_without_shutdown() {
        let (_tx, mut shutdown) = channel();
        assert!(shutdown.sleep(Duration::from_millis(5)).await);
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_sleep_interrupted_by_shutdown() {
        let (tx, mut shutdown) = channel();
        let handle = tokio::spawn(async move { shutdown.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();
        let completed = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sleep should be cancelled")
            .unwrap();
        assert!(!completed);
    }

    #[tokio::test]
    async fn test_run_skips_future_after_shutdown() {
        let (tx, mut shutdown) = channel();
        tx.send(true).unwrap();
        assert!(shutdown.is_triggered());
        assert_eq!(shutdown.run(async { 7 }).await, None);
    }

    #[tokio::test]
    async fn test_dropped_sender_counts_as_shutdown() {
        let (tx, mut shutdown) = channel();
        drop(tx);
        assert!(shutdown.is_triggered());
        assert!(!shutdown.sleep(Duration::from_secs(60)).await);
    }
}
