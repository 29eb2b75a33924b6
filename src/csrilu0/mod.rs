//! Incomplete LU factorization with zero fill, ILU(0).
//!
//! The factorization is scheduled with the same dependency analysis as
//! the lower triangular solve, and the two can share it: after
//! [`csrilu0_analysis`], a lower triangular
//! [`csrsv_analysis`](crate::csrsv::csrsv_analysis) with
//! [`AnalysisPolicy::Reuse`](crate::csrsv::AnalysisPolicy) on the same
//! matrix uses the existing analysis instead of building a new one.

#[allow(clippy::module_inception)]
mod csrilu0;
mod factor;

pub use csrilu0::*;
