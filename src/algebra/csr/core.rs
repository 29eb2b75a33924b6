#![allow(non_snake_case)]

use crate::algebra::{
    CsrMatrixView, FillMode, FloatT, IndexBase, MatDescr, SparseFormatError, SpInt,
};
use itertools::izip;
use std::iter::zip;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Sparse matrix in standard Compressed Sparse Row (CSR) format
///
/// Row offsets and column indices are stored as [`SpInt`] values relative
/// to `base`, i.e. exactly as they would be uploaded to a device.
///
/// __Example usage__ : To construct the 3 x 3 matrix
/// ```text
/// A = [1.  0.  0.]
///     [2.  3.  0.]
///     [0.  4.  5.]
/// ```
///
/// ```
/// use csrtri::algebra::*;
///
/// let A : CsrMatrix<f64> = CsrMatrix::new(
///    3,                          // m
///    3,                          // n
///    vec![0, 1, 3, 5],           // rowptr
///    vec![0, 0, 1, 1, 2],        // colval
///    vec![1., 2., 3., 4., 5.],   // nzval
///    IndexBase::Zero,
///  );
///
/// // optional correctness check
/// assert!(A.check_format().is_ok());
/// assert!(A.is_tril());
/// ```
///

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
pub struct CsrMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSR format row pointer.
    ///
    /// Ths field should have length `m+1`. The last entry less the
    /// index base corresponds to the number of nonzeros and should
    /// agree with the lengths of the `colval` and `nzval` fields.
    pub rowptr: Vec<SpInt>,
    /// vector of column indices
    pub colval: Vec<SpInt>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
    /// index base of `rowptr` and `colval`
    pub base: IndexBase,
}

impl<T> CsrMatrix<T>
where
    T: FloatT,
{
    /// `CsrMatrix` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.   This constructor does __not__ ensure that column indices
    /// are all in bounds or that data is arranged such that entries within
    /// each row appear in order of increasing column index.
    ///
    pub fn new(
        m: usize,
        n: usize,
        rowptr: Vec<SpInt>,
        colval: Vec<SpInt>,
        nzval: Vec<T>,
        base: IndexBase,
    ) -> Self {
        assert_eq!(colval.len(), nzval.len());
        assert_eq!(rowptr.len(), m + 1);
        assert_eq!((rowptr[m] - base.offset()) as usize, colval.len());
        CsrMatrix {
            m,
            n,
            rowptr,
            colval,
            nzval,
            base,
        }
    }

    /// allocate space for a zero-based sparse matrix with `nnz` elements
    pub fn spalloc(m: usize, n: usize, nnz: usize) -> Self {
        let mut rowptr = vec![0; m + 1];
        let colval = vec![0; nnz];
        let nzval = vec![T::zero(); nnz];
        rowptr[m] = nnz as SpInt;

        CsrMatrix::new(m, n, rowptr, colval, nzval, IndexBase::Zero)
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        let rowptr = (0..=n as SpInt).collect();
        let colval = (0..n as SpInt).collect();
        let nzval = vec![T::one(); n];

        CsrMatrix::new(n, n, rowptr, colval, nzval, IndexBase::Zero)
    }

    /// Build a zero-based matrix from a dense row-major array, keeping
    /// every entry that is not exactly zero.
    pub fn from_dense_rows(rows: &[Vec<T>]) -> Self {
        let m = rows.len();
        let n = rows.first().map_or(0, |r| r.len());
        let mut rowptr = Vec::with_capacity(m + 1);
        let mut colval = Vec::new();
        let mut nzval = Vec::new();

        rowptr.push(0);
        for row in rows {
            assert_eq!(row.len(), n);
            for (col, &v) in row.iter().enumerate() {
                if v != T::zero() {
                    colval.push(col as SpInt);
                    nzval.push(v);
                }
            }
            rowptr.push(colval.len() as SpInt);
        }
        CsrMatrix::new(m, n, rowptr, colval, nzval, IndexBase::Zero)
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        (self.rowptr[self.m] - self.base.offset()) as usize
    }

    /// Borrow the raw arrays as a device view interpreted through `descr`.
    ///
    /// # Panics
    /// Panics if the descriptor's index base disagrees with the matrix.
    pub fn view<'a>(&'a self, descr: &'a MatDescr) -> CsrMatrixView<'a, T> {
        assert_eq!(descr.index_base, self.base);
        CsrMatrixView::new(
            self.m as SpInt,
            self.nnz() as SpInt,
            descr,
            &self.nzval,
            &self.rowptr,
            &self.colval,
        )
    }

    /// Check that matrix data is correctly formatted.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        let base = self.base.offset();

        if self.colval.len() != self.nzval.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if self.rowptr.is_empty()
            || (self.rowptr.len() - 1) != self.m
            || self.rowptr[0] != base
            || (self.rowptr[self.m] - base) as usize != self.colval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        //check for rowptr monotonicity
        if self.rowptr.windows(2).any(|r| r[0] > r[1]) {
            return Err(SparseFormatError::BadRowptr);
        }

        //check for colval monotonicity within each row
        for row in 0..self.m {
            if self.colval[self.row_range(row)]
                .windows(2)
                .any(|c| c[0] >= c[1])
            {
                return Err(SparseFormatError::BadColOrdering);
            }
        }
        //check for column values out of bounds
        if !self
            .colval
            .iter()
            .all(|&c| c >= base && ((c - base) as usize) < self.n)
        {
            return Err(SparseFormatError::BadColval);
        }

        Ok(())
    }

    /// Returns a copy of the matrix expressed with a different index base
    pub fn to_base(&self, base: IndexBase) -> Self {
        let shift = base.offset() - self.base.offset();
        let rowptr = self.rowptr.iter().map(|&r| r + shift).collect();
        let colval = self.colval.iter().map(|&c| c + shift).collect();
        CsrMatrix::new(self.m, self.n, rowptr, colval, self.nzval.clone(), base)
    }

    /// Allocates a new matrix containing only entries from the lower
    /// (`FillMode::Lower`) or upper (`FillMode::Upper`) triangle,
    /// diagonal included.
    pub fn triangle(&self, fill_mode: FillMode) -> Self {
        let base = self.base.offset();
        let mut rowptr = Vec::with_capacity(self.m + 1);
        let mut colval = Vec::new();
        let mut nzval = Vec::new();

        rowptr.push(base);
        for row in 0..self.m {
            let rng = self.row_range(row);
            for (&c, &v) in zip(&self.colval[rng.clone()], &self.nzval[rng]) {
                let col = (c - base) as usize;
                if col == row || fill_mode.is_dependency(row, col) {
                    colval.push(c);
                    nzval.push(v);
                }
            }
            rowptr.push(colval.len() as SpInt + base);
        }
        CsrMatrix::new(self.m, self.n, rowptr, colval, nzval, self.base)
    }

    /// Lower triangle, diagonal included
    pub fn tril(&self) -> Self {
        self.triangle(FillMode::Lower)
    }

    /// Upper triangle, diagonal included
    pub fn triu(&self) -> Self {
        self.triangle(FillMode::Upper)
    }

    /// True if the matrix is lower triangular
    pub fn is_tril(&self) -> bool {
        self.is_triangle(FillMode::Lower)
    }

    /// True if the matrix is upper triangular
    pub fn is_triu(&self) -> bool {
        self.is_triangle(FillMode::Upper)
    }

    fn is_triangle(&self, fill_mode: FillMode) -> bool {
        // check the opposite triangle for any structural entries,
        // regardless of the values that may be assigned to them
        let base = self.base.offset();
        (0..self.m).all(|row| {
            self.colval[self.row_range(row)].iter().all(|&c| {
                let col = (c - base) as usize;
                col == row || fill_mode.is_dependency(row, col)
            })
        })
    }

    /// Returns the value at the given (row,col) index as an Option.
    /// Returns None if the given index is not a structural nonzero.
    ///
    /// # Panics
    /// Panics if the given index is out of bounds.
    pub fn get_entry(&self, idx: (usize, usize)) -> Option<T> {
        let (row, col) = idx;
        assert!(row < self.m && col < self.n);

        let rng = self.row_range(row);
        let first = rng.start;
        let col = col as SpInt + self.base.offset();
        match self.colval[rng].binary_search(&col) {
            Ok(idx) => Some(self.nzval[first + idx]),
            Err(_) => None,
        }
    }

    /// Dense matrix-vector product `y = A*x`, used for residual checks.
    pub fn gemv(&self, y: &mut [T], x: &[T]) {
        assert_eq!(y.len(), self.m);
        assert_eq!(x.len(), self.n);
        let base = self.base.offset();
        for (yi, &first, &last) in izip!(y.iter_mut(), &self.rowptr, &self.rowptr[1..]) {
            let rng = (first - base) as usize..(last - base) as usize;
            *yi = zip(&self.colval[rng.clone()], &self.nzval[rng])
                .fold(T::zero(), |acc, (&c, &v)| acc + v * x[(c - base) as usize]);
        }
    }

    pub(crate) fn row_range(&self, row: usize) -> std::ops::Range<usize> {
        let base = self.base.offset();
        let first = (self.rowptr[row] - base) as usize;
        let last = (self.rowptr[row + 1] - base) as usize;
        first..last
    }
}

#[test]
fn test_csr_get_entry() {
    // A =
    //[ ⋅   4.0    ⋅    ⋅   12.0]
    //[1.0  5.0    ⋅    ⋅     ⋅ ]
    //[ ⋅   6.0    ⋅    ⋅   13.0]

    let A = CsrMatrix::new(
        3,
        5,
        vec![0, 2, 4, 6],
        vec![1, 4, 0, 1, 1, 4],
        vec![4., 12., 1., 5., 6., 13.],
        IndexBase::Zero,
    );
    assert!(A.check_format().is_ok());

    assert_eq!(A.get_entry((0, 1)).unwrap(), 4.);
    assert_eq!(A.get_entry((0, 4)).unwrap(), 12.);
    assert_eq!(A.get_entry((1, 0)).unwrap(), 1.);
    assert_eq!(A.get_entry((2, 4)).unwrap(), 13.);

    assert!(A.get_entry((0, 0)).is_none());
    assert!(A.get_entry((1, 4)).is_none());
    assert!(A.get_entry((2, 2)).is_none());

    // same answers from the 1-based copy
    let B = A.to_base(IndexBase::One);
    assert!(B.check_format().is_ok());
    assert_eq!(B.rowptr, vec![1, 3, 5, 7]);
    assert_eq!(B.get_entry((0, 4)).unwrap(), 12.);
    assert!(B.get_entry((2, 2)).is_none());
}

#[test]
fn test_csr_check_format() {
    let mut A = CsrMatrix::<f64>::identity(3);
    assert!(A.check_format().is_ok());

    A.rowptr[1] = 2;
    A.rowptr[2] = 1;
    assert_eq!(A.check_format(), Err(SparseFormatError::BadRowptr));

    let mut B = CsrMatrix::<f64>::identity(3);
    B.colval[2] = 3;
    assert_eq!(B.check_format(), Err(SparseFormatError::BadColval));

    let C = CsrMatrix::<f64>::new(2, 2, vec![0, 2, 2], vec![1, 0], vec![1., 1.], IndexBase::Zero);
    assert_eq!(C.check_format(), Err(SparseFormatError::BadColOrdering));

    // spalloc puts every entry in the last row until the caller fills it in
    let mut S = CsrMatrix::<f64>::spalloc(3, 3, 3);
    assert_eq!(S.nnz(), 3);
    assert_eq!(S.rowptr, vec![0, 0, 0, 3]);
    assert_eq!(S.check_format(), Err(SparseFormatError::BadColOrdering));
    S.rowptr = vec![0, 1, 2, 3];
    S.colval = vec![0, 1, 2];
    S.nzval.fill(1.);
    assert!(S.check_format().is_ok());
    assert_eq!(S.nzval, CsrMatrix::<f64>::identity(3).nzval);
}

#[test]
fn test_csr_triangles() {
    let A = CsrMatrix::from_dense_rows(&[
        vec![4., 1., 0.],
        vec![1., 4., 1.],
        vec![0., 1., 4.],
    ]);
    assert!(!A.is_tril() && !A.is_triu());

    let L = A.tril();
    let U = A.triu();
    assert!(L.is_tril() && !L.is_triu());
    assert!(U.is_triu() && !U.is_tril());
    assert_eq!(L.nnz() + U.nnz(), A.nnz() + 3);

    let mut y = vec![0.; 3];
    A.gemv(&mut y, &[1., 1., 1.]);
    assert_eq!(y, vec![5., 6., 5.]);
}
