//! Shared cancellation flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, StilettoError};

/// Cloneable cancellation token. Every clone observes the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail `step` when the token has been cancelled.
    pub fn check(&self, step: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(StilettoError::task_execution(format!("cancelled before {}", step)));
        }
        Ok(())
    }
}
