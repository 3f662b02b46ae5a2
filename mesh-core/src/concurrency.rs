//! A reentrant mutex sound under a single-core, interrupt-driven scheduler.
//!
//! The engine mutex and the routing-table mutex are both instances of
//! [`ReentrantMutex`]. Packet `process` handlers acquire the routing-table
//! lock, inspect or update a route, and may call back into the send path,
//! which acquires the same lock again, so the lock must tolerate the same
//! holder re-entering it rather than deadlocking.
//!
//! This type is sound only because this crate targets a single CPU core: the
//! lock disables interrupts for the duration of the outermost acquisition
//! (via [`critical_section`]) and identifies "the current holder" by an
//! opaque token compared with `==`, not by a true thread id. On a
//! multi-core target two cores could both read `holder == None`
//! simultaneously inside their own critical section and both proceed,
//! corrupting the guarded value. Do not use this type on a multi-core part.

use core::cell::{Cell, RefCell};

use critical_section::Mutex as CsMutex;

/// Identifies the context currently holding a [`ReentrantMutex`].
///
/// There is no real thread id on this platform; instead each acquisition
/// context (main-loop code, the radio ISR) picks a distinct, fixed
/// [`LockId`] once and always locks with it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LockId(pub u8);

/// The single lock identity this crate uses: all of the engine's code paths
/// (receive-path interrupt context, retry sweep, announce worker,
/// application calls) run with interrupts disabled for the duration of
/// their outermost lock acquisition, so there is only ever one logical
/// holder at a time.
pub const MAIN: LockId = LockId(0);

/// A mutex that the same [`LockId`] may acquire more than once without
/// deadlocking.
pub struct ReentrantMutex<T> {
    state: CsMutex<Cell<Option<LockId>>>,
    depth: CsMutex<Cell<u32>>,
    inner: CsMutex<RefCell<T>>,
}

impl<T> ReentrantMutex<T> {
    /// Creates a new mutex guarding `value`.
    pub const fn new(value: T) -> Self {
        ReentrantMutex {
            state: CsMutex::new(Cell::new(None)),
            depth: CsMutex::new(Cell::new(0)),
            inner: CsMutex::new(RefCell::new(value)),
        }
    }

    /// Acquires the lock as `id`, runs `f` with exclusive access to the
    /// guarded value, then releases (or, if `id` already held it, merely
    /// decrements the nesting depth).
    pub fn lock<R>(&self, id: LockId, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| {
            let holder_cell = self.state.borrow(cs);
            let depth_cell = self.depth.borrow(cs);

            let reentrant = holder_cell.get() == Some(id);
            if !reentrant {
                debug_assert!(
                    holder_cell.get().is_none(),
                    "ReentrantMutex acquired by a second LockId while held"
                );
                holder_cell.set(Some(id));
            }
            depth_cell.set(depth_cell.get() + 1);

            let result = f(&mut self.inner.borrow(cs).borrow_mut());

            let remaining = depth_cell.get() - 1;
            depth_cell.set(remaining);
            if remaining == 0 {
                holder_cell.set(None);
            }

            result
        })
    }
}

// The crate's sole means of sharing its contents between the main-loop code
// and the radio ISR, which on this single-core target never run concurrently
// with each other.
unsafe impl<T: Send> Sync for ReentrantMutex<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_acquisition_runs_closure() {
        let m = ReentrantMutex::new(0u32);
        let r = m.lock(LockId(1), |v| {
            *v += 1;
            *v
        });
        assert_eq!(r, 1);
    }

    #[test]
    fn reentrant_acquisition_by_same_id_nests() {
        let m = ReentrantMutex::new(0u32);
        m.lock(LockId(1), |outer| {
            *outer += 1;
            m.lock(LockId(1), |inner| {
                *inner += 10;
            });
        });
        m.lock(LockId(1), |v| assert_eq!(*v, 11));
    }
}
