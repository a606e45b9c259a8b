//! Cancellation and deadline context threaded through every blocking operation.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use fcommon::CallContext;
//!
//! let ctx = CallContext::new().with_timeout(Duration::from_secs(30));
//! assert!(ctx.check().is_ok());
//!
//! ctx.cancel();
//! assert!(ctx.check().is_err());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextErrorKind {
    Cancelled,
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextError {
    pub kind: ContextErrorKind,
}

impl ContextError {
    pub fn cancelled() -> Self {
        Self {
            kind: ContextErrorKind::Cancelled,
        }
    }

    pub fn deadline_exceeded() -> Self {
        Self {
            kind: ContextErrorKind::DeadlineExceeded,
        }
    }
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ContextErrorKind::Cancelled => f.write_str("context cancelled"),
            ContextErrorKind::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

impl Error for ContextError {}

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tightens the deadline; an earlier existing deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derives a context cancelled together with this one but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn check(&self) -> Result<(), ContextError> {
        if self.token.is_cancelled() {
            return Err(ContextError::cancelled());
        }

        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(ContextError::deadline_exceeded());
        }

        Ok(())
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => ContextError::cancelled(),
                _ = tokio::time::sleep_until(deadline) => ContextError::deadline_exceeded(),
            },
            None => {
                self.token.cancelled().await;
                ContextError::cancelled()
            }
        }
    }

    /// Runs `future` unless the context finishes first.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        self.check()?;

        tokio::select! {
            biased;
            error = self.done() => Err(error),
            output = future => Ok(output),
        }
    }
}
