use crate::algebra::{FloatT, SpInt};
use crate::csrsv::TriangularAnalysis;
use crate::device::*;
use crate::SparseError;

/// Raw CSR structure shared by the factorization workers
pub(crate) struct Pattern<'a> {
    pub row_ptr: &'a [SpInt],
    pub col_ind: &'a [SpInt],
    pub base: SpInt,
}

impl<'a> Pattern<'a> {
    #[inline]
    fn row_range(&self, row: usize) -> std::ops::Range<usize> {
        let first = (self.row_ptr[row] - self.base) as usize;
        let last = (self.row_ptr[row + 1] - self.base) as usize;
        first..last
    }

    #[inline]
    fn col(&self, j: usize) -> SpInt {
        self.col_ind[j] - self.base
    }

    // a stored diagonal position must point at (row, row)
    fn check_diagonal(&self, row: usize, pos: Option<usize>) -> Result<(), KernelFault> {
        match pos {
            Some(p) if !self.row_range(row).contains(&p) || self.col(p) != row as SpInt => {
                Err(KernelFault::BadIndex("info"))
            }
            _ => Ok(()),
        }
    }
}

/// In place incomplete LU factorization with zero fill.
///
/// Rows are factorized in `row_map` order.   Row `i` waits for every
/// row `k < i` it references, scales its entry `(i,k)` by the pivot of
/// row `k`, and subtracts the matching part of row `k` from the
/// entries it already stores.   Afterwards the strict lower triangle
/// holds the unit lower factor L and the upper triangle holds U.
///
/// Columns must be sorted within each row.   Zero pivots are recorded
/// in `analysis`, lowest row first, and leave the affected entries
/// unscaled.
pub(crate) fn factorize<T: FloatT>(
    handle: &Handle,
    analysis: &TriangularAnalysis,
    pattern: &Pattern,
    values: &mut [T],
    ws: &mut Workspace,
) -> Result<(), SparseError> {
    handle.check_arch()?;
    let m = analysis.m();

    let views = ws.carve(m)?;
    let done = DoneArray::new(views.done);
    done.reset();

    analysis.arm_zero_pivot(analysis.structural_zero_pivot());

    let vals = SharedSlice::new(values);
    let diag_index = analysis.diag_index();

    handle.launch(m, |ticket, guard| {
        let row = analysis.row_map()[ticket] as usize;
        let rng = pattern.row_range(row);

        let mut prev = -1;
        for j in rng.clone() {
            let col = pattern.col(j);
            if col <= prev || col as usize >= m {
                return Err(KernelFault::BadIndex("csr_col_ind"));
            }
            prev = col;
        }
        // rows only read the pivots of rows that have published
        pattern.check_diagonal(row, diag_index[row])?;

        for j in rng.clone() {
            let k = pattern.col(j) as usize;
            if k >= row {
                break;
            }
            done.wait(k, guard)?;

            // structural zero pivots were recorded by the analysis
            let Some(pk) = diag_index[k] else {
                continue;
            };
            let pivot = unsafe { vals.read(pk) };
            if pivot == T::zero() {
                analysis.lower_zero_pivot(k);
                continue;
            }

            let lik = unsafe { vals.read(j) } / pivot;
            unsafe { vals.write(j, lik) };

            // subtract lik * U(k, :) where row i has a matching entry
            let mut p = j + 1;
            for q in (pk + 1)..pattern.row_range(k).end {
                let cq = pattern.col(q);
                while p < rng.end && pattern.col(p) < cq {
                    p += 1;
                }
                if p == rng.end {
                    break;
                }
                if pattern.col(p) == cq {
                    let v = unsafe { vals.read(p) - lik * vals.read(q) };
                    unsafe { vals.write(p, v) };
                }
            }
        }

        if let Some(pi) = diag_index[row] {
            if unsafe { vals.read(pi) } == T::zero() {
                analysis.lower_zero_pivot(row);
            }
        }

        done.publish(row, 1);
        Ok(())
    })
}
