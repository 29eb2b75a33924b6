//! Sparse matrix types and floating point traits.
//!
//! All matrices handled by this crate are in compressed sparse row
//! format.  Owned matrices are [`CsrMatrix`] values; the device routines
//! operate on borrowed [`CsrMatrixView`]s described by a [`MatDescr`].

mod csr;
mod descriptor;
mod error_types;
mod floats;

pub use csr::*;
pub use descriptor::*;
pub use error_types::*;
pub use floats::*;
