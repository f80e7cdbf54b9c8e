//! Intrusive reference counting for objects handed out through raw pointers.

use core::sync::atomic::{fence, AtomicUsize, Ordering};

/// A heap allocated value with an atomic reference count.
///
/// Created with a count of one. [`retain`](Self::retain) increments the count,
/// [`release`](Self::release) decrements it and frees the value when it reaches zero.
pub(crate) struct RefCounted<T> {
    count: AtomicUsize,
    value: T,
}

impl<T> RefCounted<T> {
    /// Moves `value` to the heap and returns an owning pointer with a count of one.
    pub(crate) fn into_raw(value: T) -> *mut RefCounted<T> {
        Box::into_raw(Box::new(RefCounted {
            count: AtomicUsize::new(1),
            value,
        }))
    }

    /// Borrows the value behind `pointer`.
    ///
    /// # Safety
    ///
    /// `pointer` must be null or come from [`into_raw`](Self::into_raw) and still hold a reference.
    pub(crate) unsafe fn get<'a>(pointer: *const RefCounted<T>) -> Option<&'a T> {
        unsafe { pointer.as_ref() }.map(|counted| &counted.value)
    }

    /// Adds a reference.
    ///
    /// # Safety
    ///
    /// Same as [`get`](Self::get).
    pub(crate) unsafe fn retain(pointer: *const RefCounted<T>) {
        if let Some(counted) = unsafe { pointer.as_ref() } {
            counted.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drops a reference, freeing the value when it was the last one.
    ///
    /// # Safety
    ///
    /// Same as [`get`](Self::get). The caller gives up the reference it releases.
    pub(crate) unsafe fn release(pointer: *mut RefCounted<T>) {
        let Some(counted) = (unsafe { pointer.as_ref() }) else {
            return;
        };

        if counted.count.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }

        fence(Ordering::Acquire);
        drop(unsafe { Box::from_raw(pointer) });
    }

    #[cfg(test)]
    pub(crate) unsafe fn count(pointer: *const RefCounted<T>) -> usize {
        unsafe { (*pointer).count.load(Ordering::Relaxed) }
    }
}
