//! # Abort Signal
//!
//! Cooperative cancellation token threaded through every await point.
//!
//! ## Handle / Signal Split
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RequestController                        injected operation            │
//! │  ┌──────────────┐    watch<bool>    ┌──────────────────────────┐       │
//! │  │ AbortHandle  │ ────────────────► │ AbortSignal (clonable)   │       │
//! │  │  abort()     │                   │  is_aborted()            │       │
//! │  └──────────────┘                   │  aborted().await         │       │
//! │                                     │  guard(fut).await        │       │
//! │                                     └──────────────────────────┘       │
//! │                                                                         │
//! │  One handle per execute() call. A newer call aborts the older handle.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use tokio::sync::watch;

use crate::error::{RequestError, RequestResult};

/// Creates a connected handle/signal pair.
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx })
}

/// The owning side: raises the abort flag.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Raises the flag. Idempotent.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns another signal observing this handle.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// The observing side, handed to operations.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that never fires, for one-off calls outside a controller.
    pub fn never() -> Self {
        let (_handle, signal) = abort_pair();
        signal
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the flag is raised. Never resolves if the handle is
    /// dropped without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Runs `fut` unless the signal fires first.
    ///
    /// On abort the inner future is dropped and `RequestError::Cancelled`
    /// is returned immediately; whatever it would have produced is lost.
    pub async fn guard<F>(&self, fut: F) -> RequestResult<F::Output>
    where
        F: Future,
    {
        if self.is_aborted() {
            return Err(RequestError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.aborted() => Err(RequestError::Cancelled),
            output = fut => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_abort_is_observed() {
        let (handle, signal) = abort_pair();
        let other = handle.signal();
        assert!(!signal.is_aborted());

        handle.abort();
        assert!(handle.is_aborted());
        assert!(signal.is_aborted());
        assert!(other.is_aborted());
        signal.aborted().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_returns_output_when_not_aborted() {
        let (_handle, signal) = abort_pair();
        let out = signal.guard(async { 42 }).await;
        assert_eq!(out, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_cancels_pending_future() {
        let (handle, signal) = abort_pair();

        let task = tokio::spawn(async move {
            signal
                .guard(tokio::time::sleep(Duration::from_secs(3600)))
                .await
        });
        tokio::task::yield_now().await;
        handle.abort();

        assert_eq!(task.await.unwrap(), Err(RequestError::Cancelled));
    }

    #[tokio::test]
    async fn test_guard_short_circuits_when_already_aborted() {
        let (handle, signal) = abort_pair();
        handle.abort();
        let out = signal.guard(async { "never" }).await;
        assert_eq!(out, Err(RequestError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_does_not_fire() {
        let signal = AbortSignal::never();
        assert!(!signal.is_aborted());
        let out = tokio::time::timeout(Duration::from_secs(1), signal.aborted()).await;
        assert!(out.is_err());
    }
}
