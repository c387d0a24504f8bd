//! An unsafe cell slice for parallel writes to disjoint regions.

use std::cell::UnsafeCell;

/// An unsafe cell slice.
///
/// Permits concurrent mutation of disjoint regions from multiple threads.
/// Callers must guarantee that concurrent writes never overlap.
#[derive(Copy, Clone)]
pub struct UnsafeCellSlice<'a, T>(&'a [UnsafeCell<T>]);

unsafe impl<T: Send + Sync> Send for UnsafeCellSlice<'_, T> {}
unsafe impl<T: Send + Sync> Sync for UnsafeCellSlice<'_, T> {}

impl<'a, T: Copy> UnsafeCellSlice<'a, T> {
    /// Create a new [`UnsafeCellSlice`] over `slice`.
    #[must_use]
    pub fn new(slice: &'a mut [T]) -> Self {
        let ptr = slice as *mut [T] as *const [UnsafeCell<T>];
        Self(unsafe { &*ptr })
    }

    /// Create a new [`UnsafeCellSlice`] over the spare capacity of `vec`.
    #[must_use]
    pub fn new_from_vec_with_spare_capacity(vec: &'a mut Vec<T>) -> Self {
        let ptr = vec.spare_capacity_mut() as *mut [std::mem::MaybeUninit<T>]
            as *const [UnsafeCell<T>];
        Self(unsafe { &*ptr })
    }

    /// Get a mutable reference to the underlying slice.
    ///
    /// # Safety
    /// Writes through the returned slice must not overlap with writes through
    /// any other slice returned from this method.
    #[allow(clippy::mut_from_ref)]
    #[must_use]
    pub unsafe fn get(&self) -> &'a mut [T] {
        let ptr = self.0[0].get();
        std::slice::from_raw_parts_mut(ptr, self.0.len())
    }

    /// The length of the slice.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the slice is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
