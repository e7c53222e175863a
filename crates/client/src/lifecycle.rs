//! View liveness.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Liveness flag of a mounted view.
///
/// Set when the view mounts and cleared exactly once at teardown. Async
/// continuations check it before touching view state, so a response that
/// lands after the view was replaced is dropped on the floor.
#[derive(Debug, Clone)]
pub struct MountHandle {
    alive: Arc<AtomicBool>,
}

impl MountHandle {
    pub fn mount() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Clear the flag. Returns `true` only for the call that performed the
    /// transition.
    pub fn teardown(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }
}

impl Default for MountHandle {
    fn default() -> Self {
        Self::mount()
    }
}

/// Clears a busy flag when dropped, including when the owning future is.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    /// Set `flag`. `None` if it was already set.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
