//! __csrtri__ solves sparse triangular systems
//!
//! $$ \text{op}(A)\, y = \alpha x $$
//!
//! where $A$ is the lower or upper triangle of a square matrix in
//! compressed sparse row (CSR) format, and computes incomplete LU
//! factorizations with zero fill.
//!
//! Both operations are split into an _analysis_ and an _execution_
//! phase.   The analysis discovers which rows depend on which and groups
//! the rows into dependency levels.   Execution launches one worker per
//! row onto the device pool of a [`Handle`](device::Handle); a worker
//! busy-waits on the completion flags of the rows it depends on, so
//! independent rows proceed in parallel without a global barrier
//! between levels.   One analysis is typically reused by many solves.
//!
//! ## Features
//!
//! * __Level scheduled analysis__: deterministic, level ordered row
//!   maps built with a stable counting sort.
//!
//! * __Shared analyses__: a lower triangular solve can share the
//!   analysis of an incomplete LU factorization of the same matrix.
//!
//! * __Zero pivot reporting__: structurally missing and numerically zero
//!   diagonal entries are reported as data, not errors.
//!
//! * __Explicit device context__: thread count, wavefront width, scalar
//!   pointer mode and diagnostic output are configured per [`Handle`](device::Handle).
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

//Rust hates capital matrix names
#![allow(non_snake_case)]

pub mod algebra;
pub mod csrilu0;
pub mod csrsv;
pub mod device;
pub mod io;
mod status;
pub(crate) mod timers;

pub use status::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of this library
pub fn version() -> &'static str {
    VERSION
}
