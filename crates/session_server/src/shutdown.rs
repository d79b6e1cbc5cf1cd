//! Shared shutdown coordination state.
//!
//! Components poll this flag from their long-running loops so a single
//! signal handler can stop the accept loop and any background tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle for coordinating graceful shutdown across components.
///
/// The accept loop and the application layer share one `ShutdownState`;
/// once `initiate_shutdown` is called, every loop that polls
/// `is_shutdown_initiated` winds down on its next iteration.
#[derive(Debug, Clone, Default)]
pub struct ShutdownState {
    initiated: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Creates a new shutdown state with shutdown not yet initiated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks shutdown as initiated.
    pub fn initiate_shutdown(&self) {
        self.initiated.store(true, Ordering::SeqCst);
    }

    /// Returns whether shutdown has been initiated.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }
}
