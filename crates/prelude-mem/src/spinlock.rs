//! Busy-waiting mutual exclusion.
//!
//! [`Spinlock`] is a bare lock flag with explicit `acquire`/`release`.
//! [`SpinMutex`] pairs a lock with the data it protects and hands out RAII
//! guards; it is the usual way to share an allocator between threads.
//!
//! Spinning burns CPU while waiting, so keep critical sections short.

use std::cell::UnsafeCell;
use std::fmt;
use std::hint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// A test-and-test-and-set spinlock.
#[derive(Debug, Default)]
pub struct Spinlock {
    locked: AtomicBool,
}

impl Spinlock {
    /// Creates an unlocked spinlock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spins until the lock is taken by the caller.
    #[inline]
    pub fn acquire(&self) {
        while self.locked.swap(true, Ordering::Acquire) {
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }

    /// Takes the lock if it is free. Returns `true` on success.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock.
    ///
    /// Only the holder should call this; releasing a lock held by another
    /// thread breaks its mutual exclusion.
    #[inline]
    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Returns `true` if some thread currently holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Acquires the lock and releases it when the guard drops.
    #[must_use = "the lock is released as soon as the guard is dropped"]
    pub fn lock(&self) -> SpinlockGuard<'_> {
        self.acquire();
        SpinlockGuard { lock: self }
    }
}

/// Holds a [`Spinlock`] until dropped.
#[derive(Debug)]
pub struct SpinlockGuard<'a> {
    lock: &'a Spinlock,
}

impl Drop for SpinlockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// A value protected by a [`Spinlock`].
///
/// # Examples
///
/// ```
/// use prelude_mem::{Allocator, Arena, SpinMutex};
///
/// let shared = SpinMutex::new(Arena::new(256).unwrap());
/// let a = shared.lock().alloc(16, 8).unwrap();
/// assert_eq!(shared.lock().bytes(a).len(), 16);
/// ```
pub struct SpinMutex<T> {
    lock: Spinlock,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is serialized by `lock`.
unsafe impl<T: Send> Sync for SpinMutex<T> {}

impl<T> SpinMutex<T> {
    /// Wraps `value` in an unlocked mutex.
    pub const fn new(value: T) -> Self {
        Self {
            lock: Spinlock::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Spins until the value is available.
    pub fn lock(&self) -> SpinMutexGuard<'_, T> {
        self.lock.acquire();
        SpinMutexGuard { mutex: self }
    }

    /// Locks the value if it is free.
    pub fn try_lock(&self) -> Option<SpinMutexGuard<'_, T>> {
        self.lock
            .try_acquire()
            .then(|| SpinMutexGuard { mutex: self })
    }

    /// Borrows the value without locking; `&mut self` proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Consumes the mutex, returning the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for SpinMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SpinMutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("SpinMutex").field("value", &*guard).finish(),
            None => f.write_str("SpinMutex { <locked> }"),
        }
    }
}

/// Exclusive access to the value of a [`SpinMutex`].
pub struct SpinMutexGuard<'a, T> {
    mutex: &'a SpinMutex<T>,
}

impl<T> Deref for SpinMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard holds the lock.
        unsafe { &*self.mutex.value.get() }
    }
}

impl<T> DerefMut for SpinMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard holds the lock, and `&mut self` keeps this the
        // only reference handed out through it.
        unsafe { &mut *self.mutex.value.get() }
    }
}

impl<T> Drop for SpinMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.lock.release();
    }
}
