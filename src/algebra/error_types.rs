use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
/// Error type returned by sparse matrix assembly operations.
pub enum SparseFormatError {
    /// Matrix dimension fields and/or array lengths are incompatible
    #[error("Matrix dimension fields and/or array lengths are incompatible")]
    IncompatibleDimension,
    /// Data is not sorted by column index within each row
    #[error("Data is not sorted by column index within each row")]
    BadColOrdering,
    #[error("Column value exceeds the matrix column dimension")]
    /// Column value exceeds the matrix column dimension
    BadColval,
    #[error("Bad row pointer values")]
    /// Matrix row pointer values are defective
    BadRowptr,
}
