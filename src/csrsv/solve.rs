use super::TriangularAnalysis;
use crate::algebra::{CsrMatrixView, DiagType, FloatT, SpInt};
use crate::device::*;
use crate::SparseError;

/// How a scalar argument reaches the kernel
#[derive(Clone, Copy)]
pub(crate) enum ScalarArg<'a, T> {
    /// copied in at launch
    Value(T),
    /// read from device memory by each worker
    Device(&'a T),
}

impl<'a, T: Copy> ScalarArg<'a, T> {
    pub(crate) fn new(alpha: &'a T, mode: PointerMode) -> Self {
        match mode {
            PointerMode::Host => ScalarArg::Value(*alpha),
            PointerMode::Device => ScalarArg::Device(alpha),
        }
    }

    #[inline]
    fn get(&self) -> T {
        match self {
            ScalarArg::Value(v) => *v,
            ScalarArg::Device(p) => **p,
        }
    }
}

/// Substitution `y = alpha * op(A)^{-1} x` over the triangle described
/// by `analysis`, scheduled in `row_map` order.
///
/// Entries outside the triangle are skipped, so the factors of a
/// combined LU matrix can be used directly.   A zero (or missing, for
/// non-unit diagonals) pivot is recorded in the analysis and leaves the
/// row unscaled.
pub(crate) fn solve<T: FloatT>(
    handle: &Handle,
    analysis: &TriangularAnalysis,
    A: &CsrMatrixView<T>,
    alpha: ScalarArg<T>,
    x: &[T],
    y: &mut [T],
    ws: &mut Workspace,
) -> Result<(), SparseError> {
    let wavefront = handle.check_arch()?;
    let m = analysis.m;
    let base = A.descr.index_base.offset();
    let fill_mode = analysis.fill_mode;
    let unit = A.descr.diag_type == DiagType::Unit;

    let views = ws.carve(m)?;
    let done = DoneArray::new(views.done);
    done.reset();

    if unit {
        analysis.arm_zero_pivot(None);
    } else {
        analysis.arm_zero_pivot(analysis.structural_zero_pivot);
    }

    let y = SharedSlice::new(&mut y[..m]);

    handle.launch(m, |ticket, guard| {
        let row = analysis.row_map[ticket] as usize;

        if let Some(p) = analysis.diag_index[row] {
            if !A.row_range(row).contains(&p) || A.col_ind[p] - base != row as SpInt {
                return Err(KernelFault::BadIndex("info"));
            }
        }

        let mut sum = Wavefront::new(wavefront, T::zero());
        for (k, j) in A.row_range(row).enumerate() {
            let col = A.col_ind[j] - base;
            if col < 0 || col as usize >= m {
                return Err(KernelFault::BadIndex("csr_col_ind"));
            }
            let col = col as usize;
            if !fill_mode.is_dependency(row, col) {
                continue;
            }
            done.wait(col, guard)?;
            let yj = unsafe { y.read(col) };
            sum.accumulate(k, A.values[j] * yj, |a, b| a + b);
        }

        let mut yi = alpha.get() * x[row] - sum.reduce(|a, b| a + b);

        if !unit {
            let diag = analysis.diag_index[row].map_or(T::zero(), |p| A.values[p]);
            if diag == T::zero() {
                analysis.record_zero_pivot(row);
            } else {
                yi /= diag;
            }
        }

        unsafe { y.write(row, yi) };
        done.publish(row, 1);
        Ok(())
    })
}
