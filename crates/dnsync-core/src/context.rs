//! Cancellation and deadline scoping for remote calls
//!
//! A [`CallContext`] is handed to every engine operation and every
//! [`Transport::invoke`](crate::traits::Transport::invoke). It combines a
//! [`CancellationToken`] with an optional deadline. Child contexts created
//! with [`CallContext::with_timeout`] are cancelled together with their
//! parent and never outlive its deadline.

use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation signal plus optional deadline for one logical operation
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a root context with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root context driven by an existing token
    ///
    /// Cancelling `token` (e.g. from a Ctrl-C handler) cancels every
    /// operation running under this context.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Create a root context that expires after `timeout`
    pub fn with_deadline_in(timeout: Duration) -> Self {
        Self::new().with_timeout(timeout)
    }

    /// Derive a child context that expires after `timeout`
    ///
    /// The child deadline is the earlier of the parent deadline and
    /// `now + timeout`. Cancelling the parent cancels the child; cancelling
    /// the child leaves the parent untouched.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and all contexts derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled or its deadline has passed
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// The reason this context is done, or `None` while it is still live
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::cancelled("context cancelled"));
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is cancelled or its deadline passes
    ///
    /// Never resolves for a live context without a deadline.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Run `fut` unless the context completes first
    ///
    /// A context that is already done wins over a ready future.
    pub async fn run<F, T>(&self, fut: F) -> crate::Result<T>
    where
        F: Future<Output = crate::Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.done() => Err(self.err().unwrap_or(Error::DeadlineExceeded)),
            result = fut => result,
        }
    }
}
