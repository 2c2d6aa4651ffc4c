//! Poison-tolerant lock helpers for generated objects.
//!
//! A generated object guards all of its storage behind one `RwLock`, and a
//! builder behind one `Mutex`. A poisoned lock means some caller panicked
//! while holding the guard; the data itself is still a coherent value of
//! the inner type, so generated accessors recover the guard instead of
//! propagating the panic.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquires a read guard, absorbing poisoning.
pub fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires a write guard, absorbing poisoning.
pub fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires a mutex guard, absorbing poisoning.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
