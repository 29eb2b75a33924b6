use thiserror::Error;

/// Error codes returnable from the analysis, solve and factorization routines.
///
/// Every failure is reported through one of these variants and propagated
/// unchanged to the caller.   A zero pivot is __not__ an error: it is a
/// data-level result returned alongside a successful solve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SparseError {
    #[error("Execution context is missing or has been released")]
    InvalidHandle,
    #[error("Required argument `{0}` is missing or too short")]
    InvalidPointer(&'static str),
    #[error("Invalid size for argument `{0}`")]
    InvalidSize(&'static str),
    #[error("Invalid value for argument `{0}`")]
    InvalidValue(&'static str),
    #[error("Operation not implemented for `{0}`")]
    NotImplemented(&'static str),
    #[error("Unsupported wavefront width {0}")]
    ArchMismatch(usize),
    #[error("Device allocation of {bytes} bytes failed")]
    MemoryAllocation { bytes: usize },
    #[error("Wait on row {row} exceeded the spin limit after {spins} polls")]
    SpinLimitExceeded { row: usize, spins: u64 },
    #[error("Internal device error: {0}")]
    Internal(String),
}

/// C compatible status codes, in upstream order.
#[allow(missing_docs)]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseStatus {
    Success = 0,
    InvalidHandle = 1,
    NotImplemented = 2,
    InvalidPointer = 3,
    InvalidSize = 4,
    MemoryError = 5,
    InternalError = 6,
    InvalidValue = 7,
    ArchMismatch = 8,
    ZeroPivot = 9,
}

impl SparseError {
    /// Status code corresponding to this error
    pub fn status(&self) -> SparseStatus {
        match self {
            SparseError::InvalidHandle => SparseStatus::InvalidHandle,
            SparseError::InvalidPointer(_) => SparseStatus::InvalidPointer,
            SparseError::InvalidSize(_) => SparseStatus::InvalidSize,
            SparseError::InvalidValue(_) => SparseStatus::InvalidValue,
            SparseError::NotImplemented(_) => SparseStatus::NotImplemented,
            SparseError::ArchMismatch(_) => SparseStatus::ArchMismatch,
            SparseError::MemoryAllocation { .. } => SparseStatus::MemoryError,
            SparseError::SpinLimitExceeded { .. } => SparseStatus::InternalError,
            SparseError::Internal(_) => SparseStatus::InternalError,
        }
    }
}

impl From<SparseError> for SparseStatus {
    fn from(e: SparseError) -> Self {
        e.status()
    }
}

/// Status of a call result.   A zero pivot reported by a successful call
/// maps to [`SparseStatus::ZeroPivot`].
pub fn status_of(result: &Result<Option<usize>, SparseError>) -> SparseStatus {
    match result {
        Ok(None) => SparseStatus::Success,
        Ok(Some(_)) => SparseStatus::ZeroPivot,
        Err(e) => e.status(),
    }
}

#[test]
fn test_status_codes() {
    assert_eq!(status_of(&Ok(None)), SparseStatus::Success);
    assert_eq!(status_of(&Ok(Some(3))), SparseStatus::ZeroPivot);
    assert_eq!(
        status_of(&Err(SparseError::InvalidSize("m"))),
        SparseStatus::InvalidSize
    );
    assert_eq!(SparseStatus::from(SparseError::ArchMismatch(16)) as i32, 8);
}
