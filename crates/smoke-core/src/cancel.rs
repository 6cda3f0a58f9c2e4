//! Cancellation token for interrupting a smoke run.
//!
//! The binary flips the token from its ctrl-c handler; the runner and the
//! suites poll it between checks so a run stops at a check boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation token shared between the signal handler and the runner.
///
/// # Example
///
/// ```
/// use spiread_smoke::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handler_side = token.clone();
///
/// handler_side.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Check cancellation and return an error if cancelled.
    pub fn check(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }
}

/// Error returned when a run is interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Run was interrupted")
    }
}

impl std::error::Error for CancelledError {}

impl From<CancelledError> for crate::error::SmokeError {
    fn from(_: CancelledError) -> Self {
        crate::error::SmokeError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_clone_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();

        token2.cancel();

        assert!(token1.is_cancelled());
        assert_eq!(token1.check(), Err(CancelledError));
    }

    #[test]
    fn test_cancelled_error_converts() {
        let err: crate::error::SmokeError = CancelledError.into();
        assert!(matches!(err, crate::error::SmokeError::Cancelled));
        assert_eq!(CancelledError.to_string(), "Run was interrupted");
    }
}
