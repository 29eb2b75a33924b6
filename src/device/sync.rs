use crate::SparseError;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};

/// Reason a kernel body stopped before finishing its row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KernelFault {
    /// Another worker of the same launch faulted first
    Aborted,
    /// A dependency wait exceeded the handle's spin limit
    SpinLimit { row: usize, spins: u64 },
    /// A stored index fell outside the matrix
    BadIndex(&'static str),
}

impl From<KernelFault> for SparseError {
    fn from(fault: KernelFault) -> Self {
        match fault {
            KernelFault::Aborted => SparseError::Internal("kernel launch aborted".to_string()),
            KernelFault::SpinLimit { row, spins } => SparseError::SpinLimitExceeded { row, spins },
            KernelFault::BadIndex(arg) => SparseError::InvalidValue(arg),
        }
    }
}

/// Bounds every busy-wait of one launch.
pub(crate) struct SpinGuard<'a> {
    limit: Option<u64>,
    abort: &'a AtomicBool,
}

impl<'a> SpinGuard<'a> {
    pub(crate) fn new(limit: Option<u64>, abort: &'a AtomicBool) -> Self {
        Self { limit, abort }
    }

    #[inline]
    fn check(&self, row: usize, spins: u64) -> Result<(), KernelFault> {
        if self.abort.load(Ordering::Relaxed) {
            return Err(KernelFault::Aborted);
        }
        match self.limit {
            Some(limit) if spins >= limit => Err(KernelFault::SpinLimit { row, spins }),
            _ => Ok(()),
        }
    }
}

/// Per-row completion flags in device memory.
///
/// A value of zero means "not done".  Writers publish a nonzero value with
/// Release ordering once every other write for the row is complete;
/// readers poll with Acquire ordering, so a successful [`wait`](Self::wait)
/// observes everything the finished row wrote.
pub(crate) struct DoneArray<'a> {
    flags: &'a [AtomicI32],
}

impl<'a> DoneArray<'a> {
    pub(crate) fn new(flags: &'a [AtomicI32]) -> Self {
        Self { flags }
    }

    pub(crate) fn reset(&self) {
        self.flags
            .iter()
            .for_each(|f| f.store(0, Ordering::Relaxed));
    }

    #[inline]
    pub(crate) fn publish(&self, row: usize, value: i32) {
        debug_assert!(value != 0);
        self.flags[row].store(value, Ordering::Release);
    }

    /// Spin until `row` has been published.  Returns the published value
    /// and the number of unsuccessful polls.
    #[inline]
    pub(crate) fn wait(&self, row: usize, guard: &SpinGuard) -> Result<(i32, u64), KernelFault> {
        let flag = &self.flags[row];
        let mut spins = 0u64;
        loop {
            let value = flag.load(Ordering::Acquire);
            if value != 0 {
                return Ok((value, spins));
            }
            guard.check(row, spins)?;
            spins += 1;
            std::hint::spin_loop();
        }
    }

    /// Host-side copy of the flags, for use after the launch has completed.
    pub(crate) fn to_vec(&self) -> Vec<i32> {
        self.flags
            .iter()
            .map(|f| f.load(Ordering::Relaxed))
            .collect()
    }
}

// atomic helpers matching the device intrinsics used by the kernels

#[inline]
pub(crate) fn atomic_max(target: &AtomicI32, value: i32) {
    target.fetch_max(value, Ordering::Relaxed);
}

#[inline]
pub(crate) fn atomic_add(target: &AtomicI32, value: i32) {
    target.fetch_add(value, Ordering::Relaxed);
}

#[inline]
pub(crate) fn atomic_add_u64(target: &AtomicU64, value: u64) {
    target.fetch_add(value, Ordering::Relaxed);
}

#[test]
fn test_done_array_publish_wait() {
    let flags: Vec<AtomicI32> = (0..4).map(|_| AtomicI32::new(0)).collect();
    let done = DoneArray::new(&flags);
    let abort = AtomicBool::new(false);
    let guard = SpinGuard::new(Some(10), &abort);

    done.publish(2, 3);
    assert_eq!(done.wait(2, &guard), Ok((3, 0)));

    // never published
    assert_eq!(
        done.wait(1, &guard),
        Err(KernelFault::SpinLimit { row: 1, spins: 10 })
    );

    abort.store(true, Ordering::Relaxed);
    assert_eq!(done.wait(0, &guard), Err(KernelFault::Aborted));

    done.reset();
    assert_eq!(done.to_vec(), vec![0; 4]);
}
