//! Sparse triangular solve with level-scheduled dependency analysis.
//!
//! A solve is a two stage process.   [`csrsv_analysis`] discovers the
//! row dependencies of the lower or upper triangle of a CSR matrix and
//! stores a [`TriangularAnalysis`] in a [`MatInfo`].   Any number of
//! [`csrsv_solve`] calls then reuse that analysis.
//!
//! ```
//! use csrtri::algebra::*;
//! use csrtri::csrsv::*;
//! use csrtri::device::*;
//!
//! let L = CsrMatrix::from_dense_rows(&[
//!     vec![2., 0., 0.],
//!     vec![1., 4., 0.],
//!     vec![0., 2., 1.],
//! ]);
//! let descr = MatDescr::default();
//! let A = L.view(&descr);
//!
//! let handle = Handle::new(HandleSettings::default()).unwrap();
//! let op = Operation::NonTranspose;
//! let bytes = csrsv_buffer_size(&handle, op, A.m, A.nnz, &descr).unwrap();
//! let mut ws = Workspace::with_size(bytes).unwrap();
//!
//! let mut info = MatInfo::new();
//! csrsv_analysis(&handle, op, &A, &mut info, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();
//!
//! let x = [2., 5., 3.];
//! let mut y = [0.; 3];
//! let pivot = csrsv_solve(&handle, op, &1.0, &A, &info, &x, &mut y, SolvePolicy::Auto, &mut ws).unwrap();
//!
//! assert_eq!(pivot, None);
//! assert_eq!(y, [1., 1., 1.]);
//! ```

mod analysis;
mod buffer_size;
#[allow(clippy::module_inception)]
mod csrsv;
mod info;
#[cfg(feature = "serde")]
mod json;
mod level_order;
mod policy;
mod solve;

pub use csrsv::*;
pub use info::*;
pub use policy::*;

pub(crate) use analysis::analyze;
pub(crate) use buffer_size::workspace_size;

#[path = "test.rs"]
#[cfg(test)]
mod test;
