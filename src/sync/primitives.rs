//! Synchronization primitives for ISR-safe access.
//!
//! Low-level primitive used by the shared channel wrapper.

use core::cell::RefCell;
use critical_section::Mutex;

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    ///
    /// An interrupt handler that fires while the main context holds the
    /// channel gets `None` instead of a panic.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut value))
        })
    }
}

// SAFETY: CriticalSectionCell uses critical sections to protect all access.
unsafe impl<T> Sync for CriticalSectionCell<T> {}

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn with_mutates_in_place() {
        let cell = CriticalSectionCell::new(0u32);
        cell.with(|v| *v += 5);
        assert_eq!(cell.with(|v| *v), 5);
    }

    #[test]
    fn try_with_refuses_reentry() {
        let cell = CriticalSectionCell::new(1u8);
        let nested = cell.with(|_| cell.try_with(|v| *v));
        assert_eq!(nested, None);
        assert_eq!(cell.try_with(|v| *v), Some(1));
    }
}
