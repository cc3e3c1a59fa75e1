use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CompletionError, CompletionResult};

/// Cooperative cancellation flag shared between a completion and whoever
/// may want to abort it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Err(CompletionError::Cancelled)` once [`cancel`](Self::cancel)
    /// has been called on any clone of this token.
    pub fn check(&self) -> CompletionResult<()> {
        if self.is_cancelled() {
            log::debug!("Completion cancelled");
            return Err(CompletionError::Cancelled);
        }
        Ok(())
    }
}
