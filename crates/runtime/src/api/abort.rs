use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Requests that a match stop at the next turn boundary.
///
/// Cloneable and cheap to share with input tasks or signal handlers. A turn
/// already in flight always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    requested: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let handle = AbortHandle::new();
        let remote = handle.clone();
        assert!(!handle.is_requested());
        remote.abort();
        assert!(handle.is_requested());
    }
}
