use crate::algebra::{FloatT, MatDescr, MatrixType, SpInt};
use crate::SparseError;

/// Read-only view of a CSR matrix as handed to the device routines.
///
/// Sizes are signed so that the routines can report negative
/// dimensions as [`SparseError::InvalidSize`] instead of relying
/// on the caller.   All indices are interpreted relative to the
/// descriptor's index base.
#[derive(Debug, Clone, Copy)]
pub struct CsrMatrixView<'a, T> {
    pub m: SpInt,
    pub nnz: SpInt,
    pub descr: &'a MatDescr,
    pub values: &'a [T],
    pub row_ptr: &'a [SpInt],
    pub col_ind: &'a [SpInt],
}

impl<'a, T> CsrMatrixView<'a, T>
where
    T: FloatT,
{
    pub fn new(
        m: SpInt,
        nnz: SpInt,
        descr: &'a MatDescr,
        values: &'a [T],
        row_ptr: &'a [SpInt],
        col_ind: &'a [SpInt],
    ) -> Self {
        Self {
            m,
            nnz,
            descr,
            values,
            row_ptr,
            col_ind,
        }
    }

    /// Rejects matrix types other than `General`.
    pub(crate) fn check_type(&self) -> Result<(), SparseError> {
        check_matrix_type(self.descr)
    }

    /// Shape checks on the raw arrays.  Returns `(m, nnz)` as
    /// unsigned sizes on success.
    ///
    /// Column indices are not inspected here; out of range columns are
    /// reported by the kernels that touch them.
    pub(crate) fn check_shape(&self) -> Result<(usize, usize), SparseError> {
        let (m, nnz) = check_sizes(self.m, self.nnz)?;

        if self.row_ptr.len() < m + 1 {
            return Err(SparseError::InvalidPointer("csr_row_ptr"));
        }
        if self.col_ind.len() < nnz {
            return Err(SparseError::InvalidPointer("csr_col_ind"));
        }
        if self.values.len() < nnz {
            return Err(SparseError::InvalidPointer("csr_val"));
        }

        // nothing else to check for empty matrices
        if m == 0 || nnz == 0 {
            return Ok((m, nnz));
        }

        let base = self.descr.index_base.offset();
        let row_ptr = &self.row_ptr[..=m];
        if row_ptr[0] != base
            || row_ptr[m] - base != self.nnz
            || row_ptr.windows(2).any(|r| r[0] > r[1])
        {
            return Err(SparseError::InvalidSize("csr_row_ptr"));
        }

        Ok((m, nnz))
    }

    /// Zero-based range of row `row` in `col_ind` / `values`.
    ///
    /// Only meaningful after a successful [`check_shape`](Self::check_shape).
    #[inline]
    pub(crate) fn row_range(&self, row: usize) -> std::ops::Range<usize> {
        let base = self.descr.index_base.offset();
        let first = (self.row_ptr[row] - base) as usize;
        let last = (self.row_ptr[row + 1] - base) as usize;
        first..last
    }
}

pub(crate) fn check_matrix_type(descr: &MatDescr) -> Result<(), SparseError> {
    match descr.matrix_type {
        MatrixType::General => Ok(()),
        _ => Err(SparseError::NotImplemented("matrix_type")),
    }
}

pub(crate) fn check_sizes(m: SpInt, nnz: SpInt) -> Result<(usize, usize), SparseError> {
    if m < 0 {
        return Err(SparseError::InvalidSize("m"));
    }
    if nnz < 0 {
        return Err(SparseError::InvalidSize("nnz"));
    }
    Ok((m as usize, nnz as usize))
}

#[test]
fn test_view_shape_checks() {
    use crate::algebra::IndexBase;

    let descr = MatDescr::default().with_index_base(IndexBase::One);
    let row_ptr = [1, 2, 4];
    let col_ind = [1, 1, 2];
    let values = [2., 1., 3.];

    let A = CsrMatrixView::new(2, 3, &descr, &values, &row_ptr, &col_ind);
    assert_eq!(A.check_shape(), Ok((2, 3)));
    assert_eq!(A.row_range(1), 1..3);

    let A = CsrMatrixView::new(-1, 3, &descr, &values, &row_ptr, &col_ind);
    assert_eq!(A.check_shape(), Err(SparseError::InvalidSize("m")));

    let A = CsrMatrixView::new(3, 3, &descr, &values, &row_ptr, &col_ind);
    assert_eq!(A.check_shape(), Err(SparseError::InvalidPointer("csr_row_ptr")));

    let A = CsrMatrixView::new(2, 3, &descr, &values[..2], &row_ptr, &col_ind);
    assert_eq!(A.check_shape(), Err(SparseError::InvalidPointer("csr_val")));

    // zero-based offsets under a one-based descriptor
    let bad_ptr = [0, 1, 3];
    let A = CsrMatrixView::new(2, 3, &descr, &values, &bad_ptr, &col_ind);
    assert_eq!(A.check_shape(), Err(SparseError::InvalidSize("csr_row_ptr")));
}
