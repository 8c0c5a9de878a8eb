//! Shared mutable cells for interrupt/main-loop handoff

use alloc::sync::Arc;
use core::cell::RefCell;
use critical_section::Mutex;

/// Clonable cell giving exclusive access to a record shared between
/// interrupt and main-loop code
///
/// On single-core targets the critical section is the whole exclusion
/// story; a threaded host port gets the same guarantee from the
/// `critical-section` implementation it links.
pub struct Shared<T> {
    inner: Arc<Mutex<RefCell<T>>>,
}

impl<T> Shared<T> {
    /// Wrap a value in a new shared cell
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RefCell::new(value))),
        }
    }

    /// Run `f` with exclusive access to the value
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_access() {
        let cell = Shared::new(0u32);
        let other = cell.clone();

        cell.with(|v| *v = 41);
        other.with(|v| *v += 1);

        assert_eq!(cell.with(|v| *v), 42);
    }
}
