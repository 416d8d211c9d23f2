//! Shared "processing" indicator

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flag that is true while a recording is being finalized or submitted.
///
/// Cloning shares the flag, so a front end can watch it from another task.
#[derive(Debug, Clone, Default)]
pub struct ProcessingFlag(Arc<AtomicBool>);

impl ProcessingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag until the returned guard is dropped
    pub fn raise(&self) -> ProcessingGuard {
        self.0.store(true, Ordering::SeqCst);
        ProcessingGuard(Arc::clone(&self.0))
    }
}

/// Lowers the processing flag on drop
#[derive(Debug)]
#[must_use = "the flag is lowered as soon as the guard is dropped"]
pub struct ProcessingGuard(Arc<AtomicBool>);

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
