//! Scoped console display precision.
//!
//! The precision is per thread and only changed through a
//! [`PrecisionGuard`], which restores the previous value when dropped, also
//! while unwinding.

use std::cell::Cell;
use std::marker::PhantomData;

/// Display precision when no scope is active.
pub const DEFAULT_DISPLAY_PRECISION: usize = 8;

thread_local! {
    static DISPLAY_PRECISION: Cell<usize> = const { Cell::new(DEFAULT_DISPLAY_PRECISION) };
}

/// Current display precision of this thread.
pub fn display_precision() -> usize {
    DISPLAY_PRECISION.with(Cell::get)
}

/// Restores the previous display precision on drop.
#[must_use = "the precision is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct PrecisionGuard {
    previous: usize,
    // Tied to the thread whose precision it changed.
    _not_send: PhantomData<*const ()>,
}

impl PrecisionGuard {
    pub fn set(digits: usize) -> Self {
        let previous = DISPLAY_PRECISION.with(|p| p.replace(digits));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }

    /// The precision that will be restored.
    pub fn previous(&self) -> usize {
        self.previous
    }
}

impl Drop for PrecisionGuard {
    fn drop(&mut self) {
        DISPLAY_PRECISION.with(|p| p.set(self.previous));
    }
}

/// Run `f` with the display precision set to `digits`.
pub fn with_precision<R>(digits: usize, f: impl FnOnce() -> R) -> R {
    let _guard = PrecisionGuard::set(digits);
    f()
}
