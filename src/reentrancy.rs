//! Debug-only reentrancy guard.
//!
//! The map calls user code (`Hash`, `Eq`) while it probes. A key whose
//! `Eq` reaches back into the same map (through a raw pointer or other
//! shared alias) would observe the buffer mid-probe. In debug builds the
//! guard records which operation is probing and panics on nested entry,
//! naming both operations. In release builds it is a zero-sized no-op.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map tracker. Guard each probe with `let _g = self.reentrancy.enter("get");`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // !Sync in every profile, so the map's auto traits do not depend on
    // debug_assertions.
    _nosync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosync: PhantomData,
        }
    }

    /// Enter the probing section of `op`. Panics in debug builds if another
    /// probe on the same map is still running.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!(
                    "reentrancy detected: `{op}` called on an OpenAddressingMap while `{outer}` is probing it"
                );
            }
            self.active.set(Some(op));
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return ReentrancyGuard { _z: PhantomData };
        }
    }
}

/// RAII guard returned by [`DebugReentrancy::enter`].
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
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
