//! Per-operation cancellation and deadlines.
//!
//! Every network call and every wait inside a pipeline runs through
//! [`OperationContext::run`] or [`OperationContext::sleep`], so a cancelled
//! or expired operation stops at its next await point.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

/// Why an operation stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupt {
    #[error("operation cancelled")]
    Cancelled,
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation source shared by whoever may abort operations.
#[derive(Clone)]
pub struct Cancellation {
    tx: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal cancellation to every context created from this source.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Deadline and cancellation carried through one operation.
#[derive(Clone, Debug)]
pub struct OperationContext {
    id: Uuid,
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl OperationContext {
    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            deadline: Some(Instant::now() + timeout),
            cancel: None,
        }
    }

    /// Context with neither deadline nor cancellation.
    pub fn unbounded() -> Self {
        Self {
            id: Uuid::new_v4(),
            deadline: None,
            cancel: None,
        }
    }

    /// Attach a cancellation source.
    pub fn cancelled_by(mut self, cancellation: &Cancellation) -> Self {
        self.cancel = Some(cancellation.subscribe());
        self
    }

    /// Operation ID for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if already cancelled or expired.
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(Interrupt::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Interrupt::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` until it completes, the operation is cancelled, or the
    /// deadline passes.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupt> {
        self.check()?;

        let cancel = self.cancel.clone();
        let cancelled = async move {
            match cancel {
                Some(mut rx) => {
                    if rx.wait_for(|c| *c).await.is_err() {
                        // Source dropped without cancelling.
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Interrupt::Cancelled),
            _ = expired => Err(Interrupt::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }

    /// Sleep that wakes early on cancellation or deadline.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Interrupt> {
        self.run(tokio::time::sleep(duration)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = OperationContext::with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = OperationContext::with_timeout(Duration::from_millis(20));
        let result = ctx.sleep(Duration::from_secs(5)).await;
        assert_eq!(result, Err(Interrupt::DeadlineExceeded));
        assert_eq!(ctx.check(), Err(Interrupt::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancel_wakes_sleep() {
        let cancellation = Cancellation::new();
        let ctx = OperationContext::unbounded().cancelled_by(&cancellation);

        let c = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            c.cancel();
        });

        let started = std::time::Instant::now();
        assert_eq!(ctx.sleep(Duration::from_secs(10)).await, Err(Interrupt::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancellation = Cancellation::new();
        cancellation.cancel();
        let ctx = OperationContext::unbounded().cancelled_by(&cancellation);
        assert!(cancellation.is_cancelled());
        assert_eq!(ctx.run(async { 1 }).await, Err(Interrupt::Cancelled));
    }

    #[tokio::test]
    async fn test_dropped_source_does_not_cancel() {
        let cancellation = Cancellation::new();
        let ctx = OperationContext::unbounded().cancelled_by(&cancellation);
        drop(cancellation);
        assert_eq!(ctx.run(async { "done" }).await, Ok("done"));
    }
}
