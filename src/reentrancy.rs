//! Debug-only reentrancy guard.
//!
//! The map calls into user code (`K: Hash`, `K: Eq`) in the middle of an
//! operation, e.g. after an insert has already advanced a migration step.
//! Re-entering the same map from there would observe the operation half
//! applied. In debug builds each public entry point records its name while
//! it runs and a nested entry panics naming both calls; in release builds
//! the guard compiles to nothing.
//!
//! Thread markers: the guard holds a `Cell`, so the map is `!Sync`. It
//! stays `Send`: the map owns all of its entries and holds no shared
//! handles, so moving it to another thread cannot split a guarded section.

use core::cell::Cell;
#[cfg(not(debug_assertions))]
use core::marker::PhantomData;

/// Name of the map operation currently running, if any. Guard public
/// methods with `let _g = self.reentrancy.enter("get");`.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    running: Cell<Option<&'static str>>,
    #[cfg(not(debug_assertions))]
    _not_sync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            running: Cell::new(None),
            #[cfg(not(debug_assertions))]
            _not_sync: PhantomData,
        }
    }

    /// Marks `op` as running. Panics in debug builds if another operation
    /// on the same map has not returned yet.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.running.replace(Some(op)) {
                self.running.set(Some(outer));
                panic!(
                    "reentrancy detected: ProgressiveHashMap::{op} called from user code \
                     while ProgressiveHashMap::{outer} is running"
                );
            }
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            ReentrancyGuard { _z: PhantomData }
        }
    }
}

/// Clears the running operation when dropped, including on unwind.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let op = self.owner.running.take();
            debug_assert!(op.is_some());
        }
    }
}
