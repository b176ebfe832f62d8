//! Per-call context: call id, cancellation and timeout.

use crate::error::{TransductionError, TransductionResult};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

/// Context threaded through one transducer call.
///
/// Every executor await made on behalf of the call races against the
/// context's cancellation signal and, if set, its timeout. Cloning shares
/// the signal, so cancelling any clone cancels the call.
///
/// # Example
/// ```rust,ignore
/// let ctx = CallContext::new().with_timeout(Duration::from_secs(30));
/// let handle = ctx.clone();
/// tokio::spawn(async move { shutdown.await; handle.cancel(); });
/// let summary = summarize.call_with(&ctx, email).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    call_id: Uuid,
    signal: Arc<CancellationSignal>,
    timeout: Option<Duration>,
}

impl CallContext {
    pub fn new() -> Self {
        Self {
            call_id: Uuid::now_v7(),
            signal: Arc::new(CancellationSignal::new()),
            timeout: None,
        }
    }

    /// Bound each executor call made under this context.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use the timeout only if none is set yet.
    #[must_use]
    pub(crate) fn or_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = self.timeout.or(timeout);
        self
    }

    /// Share an existing cancellation signal.
    #[must_use]
    pub fn with_signal(mut self, signal: Arc<CancellationSignal>) -> Self {
        self.signal = signal;
        self
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn signal(&self) -> Arc<CancellationSignal> {
        self.signal.clone()
    }

    /// Cancel every pending and future executor call under this context.
    pub fn cancel(&self) {
        self.signal.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Await `fut` unless the context is cancelled or the timeout elapses.
    pub async fn run<T, F>(&self, fut: F) -> TransductionResult<T>
    where
        F: Future<Output = TransductionResult<T>>,
    {
        if self.is_cancelled() {
            return Err(self.cancelled_error());
        }

        match self.timeout {
            Some(timeout) => {
                tokio::select! {
                    biased;
                    _ = self.signal.cancelled() => Err(self.cancelled_error()),
                    result = tokio::time::timeout(timeout, fut) => result.unwrap_or_else(|_| {
                        Err(TransductionError::timeout(format!(
                            "Executor call exceeded {}ms",
                            timeout.as_millis()
                        ))
                        .with_details(serde_json::json!({ "call_id": self.call_id })))
                    }),
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.signal.cancelled() => Err(self.cancelled_error()),
                    result = fut => result,
                }
            }
        }
    }

    fn cancelled_error(&self) -> TransductionError {
        TransductionError::cancelled("Transduction call was cancelled")
            .with_details(serde_json::json!({ "call_id": self.call_id }))
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation signal shared by the clones of a [`CallContext`].
#[derive(Debug)]
pub struct CancellationSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationSignal {
    /// Create a new cancellation signal
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Cancel the signal
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Check if cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancelled
    pub async fn cancelled(&self) {
        let mut notified = std::pin::pin!(self.notify.notified());
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}
