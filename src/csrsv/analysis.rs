use super::level_order::build_row_map;
use super::TriangularAnalysis;
use crate::algebra::{CsrMatrixView, FillMode, FloatT, SpInt};
use crate::device::*;
use crate::timers::*;
use crate::SparseError;
use std::sync::atomic::{AtomicI32, Ordering};

// sentinel for "no structural zero pivot" while the kernel runs
const NO_PIVOT: i32 = i32::MAX;

/// Dependency analysis of the `fill_mode` triangle of `A`.
///
/// One worker per row waits for every row its row depends on and
/// assigns itself the level `1 + max(level of dependencies)`.   Levels
/// are then turned into a level ordered `row_map` on the host.
///
/// `A` must have passed its shape checks and `ws` must be large enough
/// for `A.m` rows.
pub(crate) fn analyze<T: FloatT>(
    handle: &Handle,
    A: &CsrMatrixView<T>,
    fill_mode: FillMode,
    ws: &mut Workspace,
    timers: &mut Timers,
) -> Result<TriangularAnalysis, SparseError> {
    let wavefront = handle.check_arch()?;
    let m = A.m as usize;
    let nnz = A.nnz as usize;
    let base = A.descr.index_base.offset();

    let views = ws.carve(m)?;
    views.clear();

    let mut diag_index = device_alloc(m, None)?;
    let structural_pivot = AtomicI32::new(NO_PIVOT);

    timeit! {timers => "kernel"; {
        let done = DoneArray::new(views.done);
        let diag = SharedSlice::new(&mut diag_index);

        handle.launch(m, |ticket, guard| {
            // dependencies of a row are always handed out first
            let row = match fill_mode {
                FillMode::Lower => ticket,
                FillMode::Upper => m - 1 - ticket,
            };
            let rng = A.row_range(row);
            let row_nnz = rng.len();

            let mut level = Wavefront::new(wavefront, 0i32);
            let mut spin = Wavefront::new(wavefront, 0u64);
            let mut row_diag = None;

            for (k, j) in rng.enumerate() {
                let col = A.col_ind[j] - base;
                if col < 0 || col as usize >= m {
                    return Err(KernelFault::BadIndex("csr_col_ind"));
                }
                let col = col as usize;

                if col == row {
                    row_diag = Some(j);
                } else if fill_mode.is_dependency(row, col) {
                    let (dep_level, spins) = done.wait(col, guard)?;
                    level.accumulate(k, dep_level, i32::max);
                    spin.accumulate(k, spins, |a, b| a + b);
                }
            }

            // done[] holds level + 1, so the max over dependencies is
            // already this row's level
            let level = level.reduce(i32::max);
            let spins = spin.reduce(|a, b| a + b);

            atomic_add(&views.rows_per_level[level as usize], 1);
            atomic_max(views.max_depth, level + 1);
            atomic_add_u64(views.total_spin, spins);
            atomic_max(views.max_nnz, row_nnz as i32);

            unsafe { diag.write(row, row_diag) };
            if row_diag.is_none() {
                structural_pivot.fetch_min(row as i32, Ordering::Relaxed);
            }

            done.publish(row, level + 1);
            Ok(())
        })?;
    }}

    let max_depth = views.max_depth.load(Ordering::Relaxed) as usize;
    let total_spin = views.total_spin.load(Ordering::Relaxed);
    let max_row_nnz = views.max_nnz.load(Ordering::Relaxed) as usize;

    let mut rows_per_level = device_alloc(max_depth, 0 as SpInt)?;
    let row_map;

    timeit! {timers => "level_order"; {
        let counts = &views.rows_per_level[..max_depth];
        inclusive_sum(handle, counts, views.scan)?;
        for (dst, src) in rows_per_level.iter_mut().zip(counts) {
            *dst = src.load(Ordering::Relaxed);
        }

        let done = DoneArray::new(views.done).to_vec();
        row_map = build_row_map(&done, &rows_per_level)?;
    }}

    let structural_zero_pivot = match structural_pivot.into_inner() {
        NO_PIVOT => None,
        row => Some(row as usize),
    };

    Ok(TriangularAnalysis::new(
        fill_mode,
        m,
        nnz,
        diag_index,
        rows_per_level,
        row_map,
        total_spin,
        max_row_nnz,
        structural_zero_pivot,
    ))
}
