//! Teardown guard for scheduled frame callbacks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable liveness flag.
///
/// The host hands a clone to each scheduled frame callback. Once the view is
/// torn down the flag flips, and a callback that was already queued sees
/// `is_live() == false` and returns without touching simulation state.
#[derive(Clone, Debug)]
pub struct FrameGuard {
    live: Arc<AtomicBool>,
}

impl Default for FrameGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGuard {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Mark the owner as torn down. Idempotent.
    pub fn tear_down(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Run `frame` only while the guard is live
    pub fn run<R>(&self, frame: impl FnOnce() -> R) -> Option<R> {
        self.is_live().then(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_blocks_after_teardown() {
        let guard = FrameGuard::new();
        let scheduled = guard.clone();
        assert_eq!(scheduled.run(|| 1), Some(1));

        guard.tear_down();
        assert!(!scheduled.is_live());
        assert_eq!(scheduled.run(|| 1), None);
    }
}
