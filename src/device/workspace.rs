use super::alloc::device_alloc;
use super::scan::inclusive_sum_buffer_size;
use crate::SparseError;
use std::sync::atomic::{AtomicI32, AtomicU64};

/// Byte size of each fixed scalar slot at the head of a workspace
pub(crate) const SLOT_BYTES: usize = 256;

/// Size of a workspace for a degenerate (empty) problem
pub(crate) const DEGENERATE_BYTES: usize = 4;

/// number of elements in a per-row array for `m` rows
#[inline]
pub(crate) fn pad256(m: usize) -> usize {
    if m == 0 {
        return 0;
    }
    ((m - 1) / 256 + 1) * 256
}

/// Caller owned scratch memory for analysis, solve and factorization.
///
/// Allocate with the size returned by the matching `*_buffer_size`
/// routine and pass it unmodified.   Contents are overwritten by every
/// call and carry no information between calls.
#[derive(Debug)]
pub struct Workspace {
    // u64 backing keeps every slot 8-byte aligned
    buf: Vec<u64>,
    bytes: usize,
}

impl Workspace {
    /// Allocate a zeroed workspace of at least `bytes` bytes.
    pub fn with_size(bytes: usize) -> Result<Self, SparseError> {
        let words = (bytes + 7) / 8;
        let buf = device_alloc(words, 0u64)?;
        Ok(Self { buf, bytes })
    }

    /// Usable size in bytes.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Split the workspace into the regions used by a problem with `m` rows.
    pub(crate) fn carve(&mut self, m: usize) -> Result<WorkspaceViews<'_>, SparseError> {
        let layout = WorkspaceLayout::new(m);
        if self.bytes < layout.total {
            return Err(SparseError::InvalidPointer("temp_buffer"));
        }

        let base = self.buf.as_mut_ptr() as *mut u8;

        // Safety: all offsets lie within the allocation (checked above),
        // are multiples of 256 so satisfy atomic alignment, and the
        // regions are disjoint.  Integer memory is a valid bit pattern
        // for the atomics, and the views borrow `self` mutably.
        unsafe {
            let max_depth = &*(base as *const AtomicI32);
            let total_spin = &*(base.add(SLOT_BYTES) as *const AtomicU64);
            let max_nnz = &*(base.add(2 * SLOT_BYTES) as *const AtomicI32);
            let done = std::slice::from_raw_parts(base.add(layout.done) as *const AtomicI32, m);
            let rows_per_level =
                std::slice::from_raw_parts(base.add(layout.rows_per_level) as *const AtomicI32, m);
            let scan = std::slice::from_raw_parts(
                base.add(layout.scan) as *const AtomicI32,
                layout.scan_len,
            );
            Ok(WorkspaceViews {
                max_depth,
                total_spin,
                max_nnz,
                done,
                rows_per_level,
                scan,
            })
        }
    }
}

/// Byte offsets of the regions of a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkspaceLayout {
    pub done: usize,
    pub rows_per_level: usize,
    pub scan: usize,
    pub scan_len: usize,
    pub total: usize,
}

impl WorkspaceLayout {
    pub(crate) fn new(m: usize) -> Self {
        let row_bytes = std::mem::size_of::<i32>() * pad256(m);
        let scan_bytes = inclusive_sum_buffer_size(m);

        let done = 3 * SLOT_BYTES;
        let rows_per_level = done + row_bytes;
        let scan = rows_per_level + row_bytes;
        let total = scan + scan_bytes;

        Self {
            done,
            rows_per_level,
            scan,
            scan_len: scan_bytes / std::mem::size_of::<i32>(),
            total,
        }
    }
}

/// Typed views of a carved workspace
pub(crate) struct WorkspaceViews<'a> {
    pub max_depth: &'a AtomicI32,
    pub total_spin: &'a AtomicU64,
    pub max_nnz: &'a AtomicI32,
    pub done: &'a [AtomicI32],
    pub rows_per_level: &'a [AtomicI32],
    pub scan: &'a [AtomicI32],
}

impl<'a> WorkspaceViews<'a> {
    /// Zero the counters and per-row arrays before a kernel launch.
    pub(crate) fn clear(&self) {
        use std::sync::atomic::Ordering;
        self.max_depth.store(0, Ordering::Relaxed);
        self.total_spin.store(0, Ordering::Relaxed);
        self.max_nnz.store(0, Ordering::Relaxed);
        for v in self.done.iter().chain(self.rows_per_level) {
            v.store(0, Ordering::Relaxed);
        }
    }
}

#[test]
fn test_workspace_layout() {
    assert_eq!(pad256(0), 0);
    assert_eq!(pad256(1), 256);
    assert_eq!(pad256(256), 256);
    assert_eq!(pad256(257), 512);

    let layout = WorkspaceLayout::new(10);
    assert_eq!(layout.done, 768);
    assert_eq!(layout.rows_per_level, 768 + 1024);
    assert_eq!(layout.scan, 768 + 2048);
    assert_eq!(layout.total, 768 + 2048 + 256);
}

#[test]
fn test_workspace_carve() {
    use std::sync::atomic::Ordering;

    let m = 300;
    let mut ws = Workspace::with_size(WorkspaceLayout::new(m).total).unwrap();
    {
        let views = ws.carve(m).unwrap();
        assert_eq!(views.done.len(), m);
        assert_eq!(views.rows_per_level.len(), m);
        assert!(!views.scan.is_empty());

        views.done[m - 1].store(7, Ordering::Relaxed);
        views.total_spin.store(u64::MAX, Ordering::Relaxed);
        assert_eq!(views.rows_per_level[0].load(Ordering::Relaxed), 0);
        assert_eq!(views.max_depth.load(Ordering::Relaxed), 0);
        assert_eq!(views.max_nnz.load(Ordering::Relaxed), 0);
    }

    let mut small = Workspace::with_size(DEGENERATE_BYTES).unwrap();
    assert!(matches!(
        small.carve(m),
        Err(SparseError::InvalidPointer("temp_buffer"))
    ));
}
