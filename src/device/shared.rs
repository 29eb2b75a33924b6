use std::cell::UnsafeCell;
use std::marker::PhantomData;

/// A mutable slice shared between the workers of one kernel launch.
///
/// Device kernels write each element from exactly one worker and read
/// elements written by other workers only after the writer has published
/// completion through a [`DoneArray`](super::DoneArray).  The Release
/// store of the publisher and the Acquire load of the reader order the
/// plain accesses made through this type.
pub(crate) struct SharedSlice<'a, T> {
    data: *const UnsafeCell<T>,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// Safety: concurrent access is restricted to the single-writer /
// publish-before-read discipline described above.
unsafe impl<'a, T: Send + Sync> Sync for SharedSlice<'a, T> {}
unsafe impl<'a, T: Send + Sync> Send for SharedSlice<'a, T> {}

impl<'a, T: Copy> SharedSlice<'a, T> {
    pub(crate) fn new(slice: &'a mut [T]) -> Self {
        let len = slice.len();
        // UnsafeCell<T> has the same in-memory representation as T
        let data = slice.as_mut_ptr() as *const UnsafeCell<T>;
        Self {
            data,
            len,
            _marker: PhantomData,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Read element `i`.
    ///
    /// # Safety
    /// No other worker may be writing element `i` concurrently.
    #[inline]
    pub(crate) unsafe fn read(&self, i: usize) -> T {
        assert!(i < self.len);
        unsafe { *(*self.data.add(i)).get() }
    }

    /// Write element `i`.
    ///
    /// # Safety
    /// The calling worker must be the only one accessing element `i`
    /// until it publishes completion.
    #[inline]
    pub(crate) unsafe fn write(&self, i: usize, value: T) {
        assert!(i < self.len);
        unsafe { *(*self.data.add(i)).get() = value }
    }
}

#[test]
fn test_shared_slice_disjoint_writes() {
    use rayon::prelude::*;

    let mut v = vec![0usize; 64];
    {
        let shared = SharedSlice::new(&mut v);
        (0..shared.len()).into_par_iter().for_each(|i| {
            // each index has exactly one writer
            unsafe { shared.write(i, 2 * i) };
        });
    }
    assert!(v.iter().enumerate().all(|(i, &x)| x == 2 * i));
}
