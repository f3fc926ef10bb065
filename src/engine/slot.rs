//! Hot-swap slot for the active program.
//!
//! The control surface installs freshly compiled programs; the render thread
//! borrows the active one for a whole buffer. Both sides go through the same
//! mutex. The render side holds it for the duration of one buffer so the tree
//! it walks cannot be replaced underneath it; the control side holds it only
//! long enough to swap, and the previous program is returned to the caller so
//! it is dropped after the lock is released, never on the render thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Single-owner slot holding at most one active program.
#[derive(Debug)]
pub struct ProgramSlot<T> {
    active: Mutex<Option<T>>,
    generation: AtomicU64,
}

impl<T> ProgramSlot<T> {
    pub fn new(initial: Option<T>) -> Self {
        Self {
            active: Mutex::new(initial),
            generation: AtomicU64::new(0),
        }
    }

    // A panic while the lock is held cannot leave a half-written program
    // behind (the swap is a single move), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `program`, returning the one it replaced.
    ///
    /// The lock is released before this returns, so dropping the returned
    /// value never blocks the render thread.
    pub fn install(&self, program: T) -> Option<T> {
        let mut active = self.lock();
        let previous = active.replace(program);
        self.generation.fetch_add(1, Ordering::Relaxed);
        previous
    }

    /// Remove the active program, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        let mut active = self.lock();
        let previous = active.take();
        if previous.is_some() {
            self.generation.fetch_add(1, Ordering::Relaxed);
        }
        previous
    }

    /// Run `f` with the active program while holding the lock.
    ///
    /// The render thread calls this once per buffer; `f` must not call back
    /// into the slot.
    pub fn with_active<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let active = self.lock();
        f(active.as_ref())
    }

    pub fn is_installed(&self) -> bool {
        self.lock().is_some()
    }

    /// Number of installs and removals so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}

impl<T> Default for ProgramSlot<T> {
    fn default() -> Self {
        Self::new(None)
    }
}
