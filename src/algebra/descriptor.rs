use crate::SparseError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integer type used for sizes and indices in device-resident sparse arrays.
pub type SpInt = i32;

/// Base of the row offsets and column indices stored in a sparse matrix.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i32)]
pub enum IndexBase {
    /// C style (0-based) indexing
    #[default]
    Zero = 0,
    /// Fortran style (1-based) indexing
    One = 1,
}

impl IndexBase {
    /// The integer offset applied to every stored index.
    pub fn offset(&self) -> SpInt {
        *self as SpInt
    }
}

impl TryFrom<i32> for IndexBase {
    type Error = SparseError;
    fn try_from(base: i32) -> Result<Self, Self::Error> {
        match base {
            0 => Ok(IndexBase::Zero),
            1 => Ok(IndexBase::One),
            _ => Err(SparseError::InvalidValue("index_base")),
        }
    }
}

/// Triangle of a square matrix referenced by triangular operations.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FillMode {
    /// Lower triangular: row `i` depends on columns `j < i`
    #[default]
    Lower,
    /// Upper triangular: row `i` depends on columns `j > i`
    Upper,
}

impl FillMode {
    /// True if column `col` must be finished before row `row` can be.
    #[inline]
    pub fn is_dependency(&self, row: usize, col: usize) -> bool {
        match self {
            FillMode::Lower => col < row,
            FillMode::Upper => col > row,
        }
    }
}

/// Diagonal treatment for triangular operations.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiagType {
    /// Diagonal entries are read from the stored matrix data
    #[default]
    NonUnit,
    /// Diagonal entries are implicitly one and stored values are ignored
    Unit,
}

/// Matrix structure type.   Only `General` is supported by the
/// triangular routines.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatrixType {
    #[default]
    General,
    Symmetric,
    Hermitian,
    Triangular,
}

/// Operation applied to a matrix operand.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    #[default]
    NonTranspose,
    Transpose,
    ConjugateTranspose,
}

/// Sparse matrix descriptor
///
/// Carries the interpretation of a CSR matrix's raw arrays.  The default
/// descriptor is a general, zero-based, lower triangular matrix with a
/// stored (non-unit) diagonal.
///
/// ```
/// use csrtri::algebra::*;
///
/// let descr = MatDescr::default()
///     .with_fill_mode(FillMode::Upper)
///     .with_diag_type(DiagType::Unit);
///
/// assert_eq!(descr.index_base, IndexBase::Zero);
/// assert_eq!(descr.fill_mode, FillMode::Upper);
/// ```
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatDescr {
    pub index_base: IndexBase,
    pub fill_mode: FillMode,
    pub diag_type: DiagType,
    pub matrix_type: MatrixType,
}

impl MatDescr {
    pub fn with_index_base(mut self, base: IndexBase) -> Self {
        self.index_base = base;
        self
    }
    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }
    pub fn with_diag_type(mut self, diag_type: DiagType) -> Self {
        self.diag_type = diag_type;
        self
    }
    pub fn with_matrix_type(mut self, matrix_type: MatrixType) -> Self {
        self.matrix_type = matrix_type;
        self
    }
}

#[test]
fn test_index_base_from_raw() {
    assert_eq!(IndexBase::try_from(0).unwrap(), IndexBase::Zero);
    assert_eq!(IndexBase::try_from(1).unwrap(), IndexBase::One);
    assert!(matches!(
        IndexBase::try_from(2),
        Err(SparseError::InvalidValue("index_base"))
    ));
}

#[test]
fn test_fill_mode_dependency_side() {
    assert!(FillMode::Lower.is_dependency(3, 1));
    assert!(!FillMode::Lower.is_dependency(3, 3));
    assert!(!FillMode::Lower.is_dependency(3, 4));
    assert!(FillMode::Upper.is_dependency(1, 3));
    assert!(!FillMode::Upper.is_dependency(1, 0));
}
