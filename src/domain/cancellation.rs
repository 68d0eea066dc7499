//! Cooperative cancellation signal threaded through every store-touching call

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use super::DomainError;

/// Cloneable cancellation signal. All clones observe the same state.
#[derive(Debug, Clone)]
pub struct Cancellation {
    signal: Arc<watch::Sender<bool>>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
        }
    }

    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    /// Fail fast with `Cancelled` once the signal has fired.
    pub fn check(&self) -> Result<(), DomainError> {
        if self.is_cancelled() {
            Err(DomainError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the signal fires.
    pub async fn cancelled(&self) {
        let mut rx = self.signal.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Race `fut` against the signal. The future is dropped if cancellation wins.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, DomainError>
    where
        F: Future,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(DomainError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_completes_when_not_cancelled() {
        let cancel = Cancellation::new();
        let out = cancel.run(async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn clones_share_the_signal() {
        let cancel = Cancellation::new();
        let other = cancel.clone();
        other.cancel();
        assert!(cancel.is_cancelled());
        assert!(matches!(cancel.check(), Err(DomainError::Cancelled)));
    }

    #[tokio::test]
    async fn run_aborts_pending_work() {
        let cancel = Cancellation::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = cancel.run(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(DomainError::Cancelled)));
    }
}
