use crate::SparseError;

/// Fallible allocation of an `n` element buffer filled with `value`.
///
/// Stands in for a device allocation: failure is reported as
/// [`SparseError::MemoryAllocation`] rather than aborting the process.
pub(crate) fn device_alloc<T: Clone>(n: usize, value: T) -> Result<Vec<T>, SparseError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(n)
        .map_err(|_| SparseError::MemoryAllocation {
            bytes: n.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buf.resize(n, value);
    Ok(buf)
}

#[test]
fn test_device_alloc() {
    let v = device_alloc(5, 1i32).unwrap();
    assert_eq!(v, vec![1; 5]);

    let err = device_alloc::<u64>(usize::MAX / 4, 0).unwrap_err();
    assert!(matches!(err, SparseError::MemoryAllocation { .. }));
}
