//! Scoped Mutex Wrapper
//!
//! [`Mutexed`] pairs a value with a mutex such that the value is only
//! reachable through an access guard returned by [`Mutexed::acquire`]. The
//! guard holds the lock for its lifetime and releases it on drop.
//!
//! This is the only thread-aware building block in the crate. It is meant to
//! be composed over individual shared values; the entity store and the
//! reference manager are single-threaded by contract and are not candidates
//! for wrapping.

use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};

/// A value that can only be reached while its lock is held.
pub struct Mutexed<T> {
    value: Mutex<T>,
}

/// Lock guard with pointer-like access to the wrapped value.
///
/// The lock is released when the guard is dropped.
pub struct ScopedAccess<'a, T> {
    guard: MutexGuard<'a, T>,
}

impl<T> Mutexed<T> {
    /// Wraps `value`.
    pub const fn new(value: T) -> Self {
        Self { value: Mutex::new(value) }
    }

    /// Locks and returns an access guard.
    pub fn acquire(&self) -> ScopedAccess<'_, T> {
        ScopedAccess { guard: self.value.lock() }
    }

    /// Replaces the wrapped value.
    pub fn set(&self, value: T) {
        *self.value.lock() = value;
    }

    /// Returns a clone of the wrapped value.
    pub fn get_copy(&self) -> T
    where
        T: Clone,
    {
        self.value.lock().clone()
    }

    /// Consumes the wrapper, returning the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Returns a raw pointer to the wrapped value **without taking the
    /// lock**.
    ///
    /// This is the only operation that bypasses the lock.
    ///
    /// # Safety
    /// The caller must guarantee that no other thread accesses the value for
    /// as long as the pointer is used, and must not create aliasing mutable
    /// references while a guard is live.
    pub unsafe fn cheat(&self) -> *mut T {
        self.value.data_ptr()
    }
}

impl<T: Default> Default for Mutexed<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Deref for ScopedAccess<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for ScopedAccess<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
